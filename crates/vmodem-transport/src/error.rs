use std::path::PathBuf;

/// Errors that can occur while opening or using a host channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the modem device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the emulator socket.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The host channel description could not be understood.
    #[error("invalid host channel: {0}")]
    InvalidSpec(String),

    /// An I/O error occurred on the host channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
