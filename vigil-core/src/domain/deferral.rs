//! Deferral types
//!
//! A deferred task hands its remaining wait to a trigger. Everything the
//! trigger needs crosses the process boundary as a [`DeferralState`], and the
//! trigger answers with exactly one [`TriggerEvent`].

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobHandle, StatusSnapshot};
use crate::domain::poll::PollConfig;
use crate::error::{Result, TaskError};

/// Trigger type that resumes a deferred task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Waits for a state machine execution to finish
    ExecutionCompletion,
    /// Waits for a cluster step to finish
    StepCompletion,
}

impl TriggerKind {
    /// The dedicated polling trigger for a handle
    pub fn for_handle(handle: &JobHandle) -> Self {
        match handle {
            JobHandle::Execution { .. } => Self::ExecutionCompletion,
            JobHandle::ClusterStep { .. } => Self::StepCompletion,
        }
    }
}

/// Serializable continuation of a suspended poll
///
/// Opaque to the engine, which only stores and replays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferralState {
    pub handle: JobHandle,
    pub trigger: TriggerKind,
    pub poll: PollConfig,
    /// Status checks already spent before suspension
    pub attempts_made: u32,
    /// Absolute end of the wait when a timeout is configured
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

impl DeferralState {
    /// Creates a fresh continuation with no attempts spent
    ///
    /// The deadline, if any, starts counting now.
    pub fn new(handle: JobHandle, poll: PollConfig) -> Result<Self> {
        let trigger = TriggerKind::for_handle(&handle);
        let deadline = poll.deadline_from(chrono::Utc::now())?;

        Ok(Self {
            handle,
            trigger,
            poll,
            attempts_made: 0,
            deadline,
        })
    }

    /// Status checks left before the attempt bound is hit
    pub fn remaining_attempts(&self) -> Option<u32> {
        self.poll
            .max_attempts
            .map(|max| max.saturating_sub(self.attempts_made))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// What a trigger delivers back to the suspended task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// The job reached a terminal state
    Completed(StatusSnapshot),
    /// Polling stopped on a fatal condition before a terminal state was seen
    Errored(TaskError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_for_handle() {
        assert_eq!(
            TriggerKind::for_handle(&JobHandle::cluster_step("j-1", "s-1")),
            TriggerKind::StepCompletion
        );
        assert_eq!(
            TriggerKind::for_handle(&JobHandle::execution("arn:exec")),
            TriggerKind::ExecutionCompletion
        );
    }

    #[test]
    fn test_new_state_sets_deadline_from_timeout() {
        let before = chrono::Utc::now();
        let state = DeferralState::new(
            JobHandle::execution("arn:exec"),
            PollConfig::new(Duration::from_secs(1)).with_timeout(Duration::from_secs(60)),
        ).unwrap();

        let deadline = state.deadline.unwrap();
        assert!(deadline >= before + chrono::Duration::seconds(60));
        assert_eq!(state.attempts_made, 0);
    }

    #[test]
    fn test_no_deadline_without_timeout() {
        let state =
            DeferralState::new(JobHandle::execution("arn:exec"), PollConfig::default()).unwrap();
        assert!(state.deadline.is_none());
        assert!(state.remaining_attempts().is_none());
    }

    #[test]
    fn test_remaining_attempts() {
        let mut state = DeferralState::new(
            JobHandle::cluster_step("j-1", "s-1"),
            PollConfig::default().with_max_attempts(5),
        ).unwrap();
        state.attempts_made = 2;
        assert_eq!(state.remaining_attempts(), Some(3));

        state.attempts_made = 9;
        assert_eq!(state.remaining_attempts(), Some(0));
    }

    #[test]
    fn test_state_json_round_trip() {
        let mut state = DeferralState::new(
            JobHandle::cluster_step("j-8989898989", "s-VK57YR1Z9Z5N"),
            PollConfig::new(Duration::from_millis(250))
                .with_max_attempts(4)
                .deferrable(true),
        ).unwrap();
        state.attempts_made = 1;

        let json = state.to_json().unwrap();
        let restored = DeferralState::from_json(&json).unwrap();

        assert_eq!(restored, state);
    }

    #[test]
    fn test_errored_event_round_trip() {
        let event = TriggerEvent::Errored(TaskError::JobNotFound {
            handle: "j-1/s-1".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let restored: TriggerEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, event);
    }
}
