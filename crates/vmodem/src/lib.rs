//! Virtual modem AT transport.
//!
//! vmodem talks AT commands to an emulated cellular modem over a host
//! channel, turns the byte stream into typed responses and routes each one
//! either to the request waiting for it or to the subscribers interested in
//! unsolicited events.
//!
//! # Crate Structure
//!
//! - [`transport`]: host channel abstraction (devices, emulator sockets)
//! - [`frame`]: line grammar, typed responses, streaming reader and writer
//! - [`channel`]: conversations, the channel engine and the id allocator

/// Re-export transport types.
pub mod transport {
    pub use vmodem_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vmodem_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use vmodem_channel::*;
}
