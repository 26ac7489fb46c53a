use thiserror::Error;

/// Errors raised by persisted session storage
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No session file location is available")]
    NoLocation,
}
