use std::fmt;
use std::time::Duration;

/// Conditions a stock modem driver treats as unrecoverable.
///
/// They are always reported as this distinct kind; whether the process
/// aborts is decided by [`FatalPolicy`](crate::FatalPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Modem output could not be resolved into any known response.
    UnparseableStream,
    /// The host channel could not be opened.
    OpenFailed,
    /// A step of the init sequence was not answered with `OK`.
    InitSequence,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnparseableStream => "unparseable modem stream",
            Self::OpenFailed => "host channel open failed",
            Self::InitSequence => "init sequence failed",
        })
    }
}

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] vmodem_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] vmodem_frame::FrameError),

    /// OS-level error outside the frame layer (thread spawn, clone).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipe belongs to a channel that has since been closed.
    #[error("request pipe closed")]
    PipeClosed,

    /// No matching response arrived in time.
    #[error("no response after {0:?}")]
    Timeout(Duration),

    /// Another thread is already waiting on this conversation.
    #[error("conversation already in progress")]
    ConversationBusy,

    /// An init step was answered with something other than `OK`.
    #[error("init command {command:?} failed: {response}")]
    InitFailed { command: String, response: String },

    /// See [`FatalKind`].
    #[error("fatal: {0}")]
    Fatal(FatalKind),

    /// The request was dropped before it ran, either because the engine is
    /// shutting down or because the channel could not be (re)opened.
    #[error("channel shut down")]
    ShutDown,
}

impl ChannelError {
    /// The command got no response at all, as opposed to a negative one.
    pub fn is_no_response(&self) -> bool {
        matches!(
            self,
            Self::PipeClosed | Self::Timeout(_) | Self::Frame(_) | Self::Io(_)
        )
    }

    /// The channel that produced this error should be torn down and reopened.
    pub fn breaks_channel(&self) -> bool {
        matches!(self, Self::PipeClosed | Self::Frame(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
