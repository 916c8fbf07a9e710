/// Errors raised while turning modem bytes into responses or writing requests.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred on the host channel.
    #[error("modem I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host channel reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,

    /// The bytes at the head of the stream cannot start any known response.
    #[error("unparseable modem output starting with {preview:?}")]
    Unparseable { preview: String },

    /// Unconsumed bytes kept growing without completing a response.
    #[error("unconsumed modem output too large ({size} bytes, max {max})")]
    BufferOverflow { size: usize, max: usize },
}

impl FrameError {
    /// The byte stream can no longer be trusted and the channel must be reset.
    pub fn is_stream_failure(&self) -> bool {
        matches!(self, Self::Unparseable { .. } | Self::BufferOverflow { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
