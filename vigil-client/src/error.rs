//! Error types for the remote job client

use thiserror::Error;
use vigil_core::{JobHandle, TaskError};

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The service refused the submission
    #[error("Submission rejected: {0}")]
    StartRejected(String),

    /// The service has no record of the job
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Response could not be read as a status document
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Converts into the task failure reported for `handle`
    pub fn into_task_error(self, handle: &JobHandle) -> TaskError {
        match self {
            Self::StartRejected(reason) => TaskError::StartRejected { reason },
            Self::NotFound(_) => TaskError::JobNotFound {
                handle: handle.to_string(),
            },
            Self::InvalidResponse(message) => TaskError::InvalidOutput { message },
            Self::Internal(message) => TaskError::RemoteError { message },
        }
    }
}

impl From<ClientError> for TaskError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::StartRejected(reason) => TaskError::StartRejected { reason },
            ClientError::NotFound(handle) => TaskError::JobNotFound { handle },
            ClientError::InvalidResponse(message) => TaskError::InvalidOutput { message },
            ClientError::Internal(message) => TaskError::RemoteError { message },
        }
    }
}
