use thiserror::Error;

/// Errors that abort session startup.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A status cache could not bind its listener.
    #[error(transparent)]
    Status(#[from] cynic_status::StatusError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
