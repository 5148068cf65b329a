//! Typed errors for the pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Recoverable
//! per-source conditions never appear here: an unreadable subtree or an
//! unparseable row degrades the result set and is reported through the
//! stage reports instead.

use thiserror::Error;

/// Errors from the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store API answered with a non-success status.
    #[error("store API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure.
    #[error("store request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a geocoding lookup.
///
/// "The service answered but found nothing" is not an error; geocoders
/// return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("geocoding request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The geocoding service answered with a non-success status.
    #[error("geocoding service error {status}")]
    Api { status: u16 },

    /// The service answered with a body we cannot interpret.
    #[error("malformed geocoding response: {reason}")]
    Malformed { reason: String },
}

/// Errors surfaced to the pipeline caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Both geocoding stages failed or came back empty. Input-correctable:
    /// the caller should ask for a more precise address.
    #[error("address not resolvable: {address}")]
    UnresolvableAddress { address: String },

    /// The query parameters are invalid.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
