use thiserror::Error;

/// Errors returned by the Drive client.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Drive API answered with a non-success status.
    #[error("Drive API error {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, DriveError>;
