use thiserror::Error;

/// Errors from the status cache's HTTP surface.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The TCP listener could not be bound. Fatal: without a listener the
    /// cache cannot serve its snapshot.
    #[error("could not bind status listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while the server is already running.
    #[error("status server already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, StatusError>;
