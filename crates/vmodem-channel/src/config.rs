use std::time::Duration;

use vmodem_frame::ReaderConfig;

/// How long a conversation waits for its reply unless told otherwise.
pub const DEFAULT_CONVERSATION_TIMEOUT: Duration = Duration::from_secs(3);

/// What the engine does when a [`FatalKind`](crate::FatalKind) condition occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatalPolicy {
    /// Log and abort the process.
    Abort,
    /// Log, close the channel and let the next requester reopen it.
    #[default]
    Reset,
}

/// Channel engine configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Timeout of the engine's own conversation.
    pub conversation_timeout: Duration,
    pub fatal_policy: FatalPolicy,
    /// Open attempts per (re)open before the fatal policy applies.
    pub open_attempts: u32,
    pub open_backoff: Duration,
    /// How often the reader thread checks whether it should stop.
    pub read_poll_interval: Duration,
    /// Pause after a failed read before reading again.
    pub read_error_backoff: Duration,
    pub reader: ReaderConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            conversation_timeout: DEFAULT_CONVERSATION_TIMEOUT,
            fatal_policy: FatalPolicy::default(),
            open_attempts: 3,
            open_backoff: Duration::from_millis(500),
            read_poll_interval: Duration::from_millis(100),
            read_error_backoff: Duration::from_millis(10),
            reader: ReaderConfig::default(),
        }
    }
}
