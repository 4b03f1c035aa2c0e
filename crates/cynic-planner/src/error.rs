use thiserror::Error;

/// Errors from event construction.
#[derive(Debug, Error)]
pub enum EventError {
    /// Recurrence intervals start at one second.
    #[error("invalid interval: {secs}s (must be at least 1)")]
    InvalidInterval { secs: u64 },

    /// The endpoint URL could not be parsed.
    #[error("invalid endpoint url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client backing a JSON event could not be built.
    #[error("could not build http client: {reason}")]
    HttpClient { reason: String },
}

pub type Result<T> = std::result::Result<T, EventError>;
