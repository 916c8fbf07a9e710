//! Host channel transport for the virtual modem.
//!
//! The host channel is the byte stream between the driver and the emulated
//! modem. It is one of:
//! - a character device or virtual port (`/dev/hvc*`, `/dev/ttyS*`, virtio ports)
//! - a Unix domain socket exposed by an emulator
//!
//! This is the lowest layer of vmodem. Everything else builds on top of
//! the [`HostChannel`] type provided here.

pub mod error;

#[cfg(unix)]
pub mod channel;
#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod factory;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use channel::HostChannel;
#[cfg(unix)]
pub use device::{connect_socket, open_device};
#[cfg(unix)]
pub use factory::{HostChannelFactory, HostChannelSpec};
