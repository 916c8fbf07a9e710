use std::fs::{File, OpenOptions};
use std::mem::MaybeUninit;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::net::UnixStream;
use std::path::Path;

use tracing::{debug, info};

use crate::channel::HostChannel;
use crate::error::{Result, TransportError};

/// Open a modem character device or virtual port read-write.
///
/// The device never becomes the controlling terminal. If it is a TTY it is
/// switched to raw mode so line discipline does not rewrite `\r` or echo
/// requests back.
pub fn open_device(path: impl AsRef<Path>) -> Result<HostChannel> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
        .map_err(|e| TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

    if make_raw(&file).map_err(|e| TransportError::Open {
        path: path.to_path_buf(),
        source: e,
    })? {
        debug!(?path, "switched tty to raw mode");
    }

    info!(?path, "opened modem device");
    Ok(HostChannel::from_device(file))
}

/// Connect to an emulator's Unix domain socket (blocking).
pub fn connect_socket(path: impl AsRef<Path>) -> Result<HostChannel> {
    let path = path.as_ref();
    let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(?path, "connected to modem socket");
    Ok(HostChannel::from_unix(stream))
}

/// Put a TTY into raw mode. Returns `false` for anything that is not a TTY.
fn make_raw(file: &File) -> std::io::Result<bool> {
    let fd = file.as_raw_fd();

    // SAFETY: `fd` is an open descriptor owned by `file`.
    if unsafe { libc::isatty(fd) } != 1 {
        return Ok(false);
    }

    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: `termios` points to writable storage of the right size; on
    // success tcgetattr fully initializes it.
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: initialized by the successful tcgetattr above.
    let mut termios = unsafe { termios.assume_init() };

    // SAFETY: `termios` is a valid, initialized struct.
    unsafe { libc::cfmakeraw(&mut termios) };

    // SAFETY: `fd` is open and `termios` is a valid struct.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(true)
}
