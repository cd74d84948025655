use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors reported by a shoot service implementation.
///
/// Every variant is distinguishable so callers can tell a rejected request from an
/// unreachable server.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("shoot service unreachable: {0}")]
    Transport(String),
    /// The server answered with an unexpected status code.
    #[error("unexpected shoot service status {status} for `{path}`")]
    Status {
        /// Request path, relative to the base URL.
        path: String,
        /// HTTP status returned.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("failed to decode shoot service response for `{path}`: {message}")]
    Decode {
        /// Request path, relative to the base URL.
        path: String,
        /// Decoder message.
        message: String,
    },
    /// The server refused the operation.
    #[error("rejected: {0}")]
    Rejected(String),
    /// Requested shoot does not exist.
    #[error("shoot `{0}` not found")]
    NotFound(String),
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

/// Errors raised by a notification channel implementation.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The connection could not be established.
    #[error("channel connection failed: {0}")]
    Connect(String),
    /// A subscription change could not be sent.
    #[error("channel subscription for `{code}` failed: {message}")]
    Subscription {
        /// Shoot code being (un)subscribed.
        code: String,
        /// Transport message.
        message: String,
    },
}

/// Errors surfaced by coordinator flows that return a `Result`.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A shoot service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The service answered but refused the operation.
    #[error("operation rejected: {0}")]
    Rejected(String),
    /// Caller input did not pass validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The persisted session record could not be written or cleared.
    #[error("session storage failed")]
    Storage(#[from] StorageError),
}

impl From<ValidationErrors> for CoordinatorError {
    fn from(err: ValidationErrors) -> Self {
        CoordinatorError::InvalidInput(format!("validation failed: {}", err))
    }
}
