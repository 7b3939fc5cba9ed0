//! Error handling for Vidloader

use thiserror::Error;

/// Main error type for Vidloader
#[derive(Debug, Error)]
pub enum VidloaderError {
    /// Backend rejected an extraction request
    #[error("{0}")]
    Extraction(String),

    /// Backend refused to start a download
    #[error("{0}")]
    Start(String),

    /// Backend refused to delete a download
    #[error("{0}")]
    Delete(String),

    #[error("Failed to fetch download history: {0}")]
    HistoryFetch(String),

    /// A progress payload could not be decoded. Logged, never surfaced.
    #[error("Malformed progress payload: {0}")]
    ChannelDecode(String),

    /// The progress stream dropped. Logged, never surfaced.
    #[error("Progress channel transport error: {0}")]
    ChannelTransport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, VidloaderError>;

impl VidloaderError {
    /// Whether this error belongs to the user-facing request taxonomy
    /// (shown inline and retryable by re-submitting).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            VidloaderError::Extraction(_)
                | VidloaderError::Start(_)
                | VidloaderError::Delete(_)
                | VidloaderError::InvalidUrl(_)
                | VidloaderError::Network(_)
        )
    }
}
