//! AT response framing for the virtual modem.
//!
//! Bytes read from the host channel are split into complete responses by a
//! carry-over dispatcher and parsed into typed [`AtResponse`] values:
//! - [`parser`] is the cursor the per-command grammars are written with
//! - [`grammar`] recognizes one response at the head of a byte span
//! - [`reader`] feeds arbitrarily chunked reads through the grammar
//! - [`writer`] sends `\r`-terminated request lines
//!
//! No partial responses ever reach callers.

pub mod error;
pub mod grammar;
pub mod hexcodec;
pub mod parser;
pub mod reader;
pub mod response;
pub mod writer;

pub use error::{FrameError, Result};
pub use grammar::{parse, ParseOutcome};
pub use parser::Parser;
pub use reader::{
    ReaderConfig, ResponseDecoder, ResponseReader, DEFAULT_MAX_UNCONSUMED,
    DEFAULT_READ_CHUNK_SIZE,
};
pub use response::{AtResponse, AtResponsePtr, ResponseKind};
pub use writer::RequestWriter;
