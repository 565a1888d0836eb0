//! Job domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::classifier;
use crate::error::{Result, TaskError};

/// Identifies a started remote execution
///
/// Obtained once from the remote service and never re-derived while polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobHandle {
    /// A state machine execution
    Execution { execution_arn: String },
    /// A step submitted to a compute cluster
    ClusterStep { cluster_id: String, step_id: String },
}

impl JobHandle {
    pub fn execution(execution_arn: impl Into<String>) -> Self {
        Self::Execution {
            execution_arn: execution_arn.into(),
        }
    }

    pub fn cluster_step(cluster_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self::ClusterStep {
            cluster_id: cluster_id.into(),
            step_id: step_id.into(),
        }
    }

    /// The remote service this handle belongs to
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Execution { .. } => ServiceKind::StateMachine,
            Self::ClusterStep { .. } => ServiceKind::ClusterStep,
        }
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution { execution_arn } => write!(f, "{}", execution_arn),
            Self::ClusterStep {
                cluster_id,
                step_id,
            } => write!(f, "{}/{}", cluster_id, step_id),
        }
    }
}

/// Remote service family, selects the status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    StateMachine,
    ClusterStep,
}

/// Classified job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Interrupted,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Interrupted)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Status document as reported by the remote service
///
/// Fields are passed through untouched; only `state` is interpreted, and only
/// by the classifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawStatus {
    pub state: String,
    pub failure_reason: Option<String>,
    /// Detail reported next to the reason, when the service splits the two
    pub failure_cause: Option<String>,
    pub log_uri: Option<String>,
    pub output: Option<JsonValue>,
}

impl RawStatus {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn with_failure(mut self, reason: impl Into<String>, log_uri: Option<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self.log_uri = log_uri;
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.failure_cause = Some(cause.into());
        self
    }

    pub fn with_output(mut self, output: JsonValue) -> Self {
        self.output = Some(output);
        self
    }
}

/// Result of a single status check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub handle: JobHandle,
    pub state: JobState,
    pub raw_state: String,
    pub failure_reason: Option<String>,
    pub failure_cause: Option<String>,
    pub log_uri: Option<String>,
    pub output: Option<JsonValue>,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

impl StatusSnapshot {
    /// Classifies a raw status document reported for `handle`
    pub fn from_raw(handle: &JobHandle, raw: RawStatus) -> Result<Self> {
        let state = classifier::classify(handle, &raw.state)?;

        Ok(Self {
            handle: handle.clone(),
            state,
            raw_state: raw.state,
            failure_reason: raw.failure_reason,
            failure_cause: raw.failure_cause,
            log_uri: raw.log_uri,
            output: raw.output,
            observed_at: chrono::Utc::now(),
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Resolves a terminal snapshot into the task's output or failure
    ///
    /// Both the in-process poll loop and the resume path go through here, so
    /// a given status sequence ends the same way in either mode.
    pub fn into_result(self) -> Result<JsonValue> {
        let handle = self.handle.to_string();
        let reason = match (self.failure_reason, self.failure_cause) {
            (Some(reason), Some(cause)) => Some(format!("{}: {}", reason, cause)),
            (reason, cause) => reason.or(cause),
        };

        match self.state {
            JobState::Succeeded => Ok(self.output.unwrap_or(JsonValue::Null)),
            JobState::Failed => Err(TaskError::JobFailed {
                handle,
                reason,
                log_uri: self.log_uri,
            }),
            JobState::Cancelled => Err(TaskError::JobCancelled {
                handle,
                state: self.raw_state,
                reason,
                log_uri: self.log_uri,
            }),
            JobState::Interrupted => Err(TaskError::JobInterrupted {
                handle,
                reason,
                log_uri: self.log_uri,
            }),
            JobState::Pending | JobState::Running => Err(TaskError::InvalidTransition {
                state: self.state.to_string(),
                action: "resolve a non-terminal snapshot".to_string(),
            }),
        }
    }
}
