//! Error taxonomy for workspace operations.

use thiserror::Error;

/// Errors produced by the workspace stores and the remote service client.
#[derive(Debug, Error)]
pub enum Error {
    /// Client-side validation failed; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The service rejected the credential (HTTP 401).
    #[error("authorization rejected")]
    Unauthorized,

    /// A role-gated action was refused, locally or by the service (HTTP 403).
    #[error("{0}")]
    Forbidden(String),

    /// The service answered with a non-2xx status and a message.
    #[error("{0}")]
    Service(String),

    /// The request could not complete.
    #[error("network error: {0}")]
    Network(String),

    /// A local prerequisite for the operation was missing.
    #[error("{0}")]
    Precondition(String),
}

impl Error {
    /// Message suitable for direct display to the user.
    ///
    /// Service messages are surfaced verbatim; transport failures collapse
    /// into a generic retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => "An unexpected error occurred. Please try again.".to_string(),
            Error::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
