//! Error types for task execution
//!
//! Every fatal condition a task can hit is a [`TaskError`]. The engine sees a
//! single failure kind, while callers and tests can still tell the
//! sub-kinds apart through [`TaskError::code`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for task operations
pub type Result<T> = std::result::Result<T, TaskError>;

/// Stable, machine-readable identifier for each failure sub-kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    StartRejected,
    JobNotFound,
    UnrecognizedState,
    JobFailed,
    JobCancelled,
    JobInterrupted,
    PollTimeout,
    InvalidTransition,
    InvalidConfig,
    InvalidOutput,
    RemoteError,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartRejected => "start_rejected",
            Self::JobNotFound => "job_not_found",
            Self::UnrecognizedState => "unrecognized_state",
            Self::JobFailed => "job_failed",
            Self::JobCancelled => "job_cancelled",
            Self::JobInterrupted => "job_interrupted",
            Self::PollTimeout => "poll_timeout",
            Self::InvalidTransition => "invalid_transition",
            Self::InvalidConfig => "invalid_config",
            Self::InvalidOutput => "invalid_output",
            Self::RemoteError => "remote_error",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported failure of a task
///
/// None of these are retried by the executor; retry policy belongs to the
/// engine wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum TaskError {
    /// The remote service refused to start the job
    #[error("Job submission rejected: {reason}")]
    StartRejected { reason: String },

    /// The remote service has no record of the job
    #[error("Job not found: {handle}")]
    JobNotFound { handle: String },

    /// The remote service reported a state we do not know how to classify
    #[error("Unrecognized state '{state}' reported for {handle}")]
    UnrecognizedState { handle: String, state: String },

    /// Job reached a failed terminal state
    #[error("Job {handle} failed: {}", describe_failure(.reason, .log_uri))]
    JobFailed {
        handle: String,
        reason: Option<String>,
        log_uri: Option<String>,
    },

    /// Job was cancelled or aborted on the remote side
    #[error("Job {handle} was cancelled (state {state}){}", describe_details(.reason, .log_uri))]
    JobCancelled {
        handle: String,
        state: String,
        reason: Option<String>,
        log_uri: Option<String>,
    },

    /// Job was interrupted on the remote side
    #[error("Job {handle} was interrupted{}", describe_details(.reason, .log_uri))]
    JobInterrupted {
        handle: String,
        reason: Option<String>,
        log_uri: Option<String>,
    },

    /// Still non-terminal after the configured bound
    #[error("Job {handle} did not finish after {attempts} status check(s)")]
    PollTimeout { handle: String, attempts: u32 },

    /// Executor was driven out of order
    #[error("Cannot {action} while executor is {state}")]
    InvalidTransition { state: String, action: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Remote output could not be decoded
    #[error("Invalid job output: {message}")]
    InvalidOutput { message: String },

    /// The remote service could not be reached or answered garbage
    #[error("Remote service error: {message}")]
    RemoteError { message: String },
}

fn describe_failure(reason: &Option<String>, log_uri: &Option<String>) -> String {
    let reason = reason.as_deref().unwrap_or("no reason reported");
    match log_uri {
        Some(uri) => format!("{} (logs: {})", reason, uri),
        None => reason.to_string(),
    }
}

fn describe_details(reason: &Option<String>, log_uri: &Option<String>) -> String {
    if reason.is_none() && log_uri.is_none() {
        return String::new();
    }
    format!(": {}", describe_failure(reason, log_uri))
}

impl TaskError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            message: message.into(),
        }
    }

    /// Returns the failure sub-kind
    pub fn code(&self) -> FailureCode {
        match self {
            Self::StartRejected { .. } => FailureCode::StartRejected,
            Self::JobNotFound { .. } => FailureCode::JobNotFound,
            Self::UnrecognizedState { .. } => FailureCode::UnrecognizedState,
            Self::JobFailed { .. } => FailureCode::JobFailed,
            Self::JobCancelled { .. } => FailureCode::JobCancelled,
            Self::JobInterrupted { .. } => FailureCode::JobInterrupted,
            Self::PollTimeout { .. } => FailureCode::PollTimeout,
            Self::InvalidTransition { .. } => FailureCode::InvalidTransition,
            Self::InvalidConfig { .. } => FailureCode::InvalidConfig,
            Self::InvalidOutput { .. } => FailureCode::InvalidOutput,
            Self::RemoteError { .. } => FailureCode::RemoteError,
        }
    }

    /// Check if the remote side ended the job unsuccessfully
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            Self::JobFailed { .. } | Self::JobCancelled { .. } | Self::JobInterrupted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_includes_reason_and_logs() {
        let err = TaskError::JobFailed {
            handle: "j-1/s-1".to_string(),
            reason: Some("Unknown Error.".to_string()),
            log_uri: Some("s3://logs/s-1".to_string()),
        };

        assert_eq!(
            err.to_string(),
            "Job j-1/s-1 failed: Unknown Error. (logs: s3://logs/s-1)"
        );
        assert_eq!(err.code(), FailureCode::JobFailed);
        assert!(err.is_terminal_failure());
    }

    #[test]
    fn test_failed_message_without_reason() {
        let err = TaskError::JobFailed {
            handle: "j-1/s-1".to_string(),
            reason: None,
            log_uri: None,
        };

        assert_eq!(err.to_string(), "Job j-1/s-1 failed: no reason reported");
    }

    #[test]
    fn test_codes_are_distinct_per_kind() {
        let cancelled = TaskError::JobCancelled {
            handle: "h".to_string(),
            state: "CANCELLED".to_string(),
            reason: None,
            log_uri: None,
        };
        let interrupted = TaskError::JobInterrupted {
            handle: "h".to_string(),
            reason: None,
            log_uri: None,
        };

        assert_ne!(cancelled.code(), interrupted.code());
        assert_eq!(cancelled.to_string(), "Job h was cancelled (state CANCELLED)");
        assert_eq!(interrupted.to_string(), "Job h was interrupted");
        let config = TaskError::InvalidConfig {
            message: "x".to_string(),
        };
        assert!(!config.is_terminal_failure());
    }

    #[test]
    fn test_error_survives_serialization() {
        let err = TaskError::PollTimeout {
            handle: "arn:exec".to_string(),
            attempts: 3,
        };

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"code\":\"poll_timeout\""));

        let back: TaskError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
