use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::error::Result;

/// An open host channel to the modem. Implements `Read` and `Write`.
///
/// Both `&HostChannel` and `HostChannel` implement the I/O traits, so one
/// clone can be read by the reader thread while another is written by the
/// request thread.
pub struct HostChannel {
    inner: HostChannelInner,
}

enum HostChannelInner {
    Device(File),
    Unix(UnixStream),
}

impl Read for HostChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Read for &HostChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &self.inner {
            HostChannelInner::Device(file) => (&*file).read(buf),
            HostChannelInner::Unix(stream) => (&*stream).read(buf),
        }
    }
}

impl Write for HostChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (&*self).flush()
    }
}

impl Write for &HostChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.inner {
            HostChannelInner::Device(file) => (&*file).write(buf),
            HostChannelInner::Unix(stream) => (&*stream).write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.inner {
            HostChannelInner::Device(file) => (&*file).flush(),
            HostChannelInner::Unix(stream) => (&*stream).flush(),
        }
    }
}

impl HostChannel {
    pub(crate) fn from_device(file: File) -> Self {
        Self {
            inner: HostChannelInner::Device(file),
        }
    }

    pub(crate) fn from_unix(stream: UnixStream) -> Self {
        Self {
            inner: HostChannelInner::Unix(stream),
        }
    }

    /// Create a connected pair of in-process channels.
    ///
    /// One end plays the driver, the other the modem. Used by tests and by
    /// emulation harnesses that script a modem.
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Self::from_unix(a), Self::from_unix(b)))
    }

    /// Try to clone this channel (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            HostChannelInner::Device(file) => Ok(Self::from_device(file.try_clone()?)),
            HostChannelInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Block until the channel has bytes to read (or has hung up), at most `timeout`.
    ///
    /// Returns `Ok(false)` when the timeout elapsed with nothing to read.
    pub fn wait_readable(&self, timeout: Duration) -> std::io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `pfd` is a valid, writable pollfd and the count passed is 1.
        // The descriptor stays open for the duration of the call since `self`
        // is borrowed.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(rc > 0)
    }

    /// Shut down both directions of a socket channel.
    ///
    /// Device channels have no shutdown; they close when the last clone drops.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            HostChannelInner::Device(_) => Ok(()),
            HostChannelInner::Unix(stream) => match stream.shutdown(std::net::Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            HostChannelInner::Device(_) => "device",
            HostChannelInner::Unix(_) => "unix-socket",
        }
    }
}

impl AsRawFd for HostChannel {
    fn as_raw_fd(&self) -> RawFd {
        match &self.inner {
            HostChannelInner::Device(file) => file.as_raw_fd(),
            HostChannelInner::Unix(stream) => stream.as_raw_fd(),
        }
    }
}

impl std::fmt::Debug for HostChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostChannel")
            .field("type", &self.transport_name())
            .field("fd", &self.as_raw_fd())
            .finish()
    }
}
