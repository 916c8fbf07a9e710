//! AT conversation engine for the virtual modem.
//!
//! Service façades queue requesters on an [`AtChannel`]; each requester gets
//! a [`RequestPipe`] to the currently open host channel and typically runs
//! one [`Conversation`]: send a command, block until a response matching a
//! filter arrives or the timeout passes. Everything the modem sends that no
//! conversation claims is broadcast to the registered subscribers.

pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod id_allocator;
pub mod init;
pub mod pipe;
pub mod subscriber;

mod sync;

pub use config::{ChannelConfig, FatalPolicy, DEFAULT_CONVERSATION_TIMEOUT};
pub use conversation::Conversation;
pub use engine::{AtChannel, Requester};
pub use error::{ChannelError, FatalKind, Result};
pub use id_allocator::IdAllocator;
pub use init::{CommandSequence, InitSequence, STANDARD_INIT_COMMANDS};
pub use pipe::RequestPipe;
pub use subscriber::{ResponseSink, ResponseSubscriber};
