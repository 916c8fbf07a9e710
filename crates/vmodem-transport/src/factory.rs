use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::channel::HostChannel;
use crate::device::{connect_socket, open_device};
use crate::error::{Result, TransportError};

/// Opens a fresh host channel on demand.
///
/// The channel engine calls this lazily, and again after every reset, so an
/// implementation must be able to open the channel repeatedly.
pub trait HostChannelFactory: Send + Sync {
    /// Open a new connection to the modem.
    fn open(&self) -> Result<HostChannel>;
}

impl<F> HostChannelFactory for F
where
    F: Fn() -> Result<HostChannel> + Send + Sync,
{
    fn open(&self) -> Result<HostChannel> {
        self()
    }
}

/// Where the modem lives.
///
/// Parsed from a string: `unix:<path>` names an emulator socket, anything
/// else is a device path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostChannelSpec {
    Device(PathBuf),
    Socket(PathBuf),
}

impl HostChannelSpec {
    const SOCKET_PREFIX: &'static str = "unix:";
}

impl HostChannelFactory for HostChannelSpec {
    fn open(&self) -> Result<HostChannel> {
        match self {
            Self::Device(path) => open_device(path),
            Self::Socket(path) => connect_socket(path),
        }
    }
}

impl FromStr for HostChannelSpec {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix(Self::SOCKET_PREFIX) {
            if path.is_empty() {
                return Err(TransportError::InvalidSpec(format!(
                    "missing socket path in {s:?}"
                )));
            }
            return Ok(Self::Socket(PathBuf::from(path)));
        }
        if s.is_empty() {
            return Err(TransportError::InvalidSpec("empty device path".to_string()));
        }
        Ok(Self::Device(PathBuf::from(s)))
    }
}

impl fmt::Display for HostChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(path) => write!(f, "{}", path.display()),
            Self::Socket(path) => write!(f, "{}{}", Self::SOCKET_PREFIX, path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_path() {
        let spec: HostChannelSpec = "/dev/hvc2".parse().unwrap();
        assert_eq!(spec, HostChannelSpec::Device(PathBuf::from("/dev/hvc2")));
        assert_eq!(spec.to_string(), "/dev/hvc2");
    }

    #[test]
    fn parse_socket_path() {
        let spec: HostChannelSpec = "unix:/tmp/modem.sock".parse().unwrap();
        assert_eq!(spec, HostChannelSpec::Socket(PathBuf::from("/tmp/modem.sock")));
        assert_eq!(spec.to_string(), "unix:/tmp/modem.sock");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            "".parse::<HostChannelSpec>(),
            Err(TransportError::InvalidSpec(_))
        ));
        assert!(matches!(
            "unix:".parse::<HostChannelSpec>(),
            Err(TransportError::InvalidSpec(_))
        ));
    }

    #[test]
    fn closure_is_a_factory() {
        let factory = || -> Result<HostChannel> {
            let (driver, _modem) = HostChannel::pair()?;
            Ok(driver)
        };
        let channel = HostChannelFactory::open(&factory).unwrap();
        assert_eq!(channel.transport_name(), "unix-socket");
    }

    #[test]
    fn spec_open_reports_missing_socket() {
        let spec = HostChannelSpec::Socket(PathBuf::from("/nonexistent/vmodem.sock"));
        assert!(matches!(spec.open(), Err(TransportError::Connect { .. })));
    }
}
