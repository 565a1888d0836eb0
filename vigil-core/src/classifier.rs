//! Status classification
//!
//! Maps the raw state string a remote service reports onto a [`JobState`].
//! Lookups are exact; a state missing from the table is an error rather than
//! a guess.

use crate::domain::job::{JobHandle, JobState, ServiceKind};
use crate::error::{Result, TaskError};

const STATE_MACHINE_STATES: &[(&str, JobState)] = &[
    ("PENDING_REDRIVE", JobState::Pending),
    ("RUNNING", JobState::Running),
    ("SUCCEEDED", JobState::Succeeded),
    ("FAILED", JobState::Failed),
    ("TIMED_OUT", JobState::Failed),
    ("ABORTED", JobState::Cancelled),
];

const CLUSTER_STEP_STATES: &[(&str, JobState)] = &[
    ("PENDING", JobState::Pending),
    ("RUNNING", JobState::Running),
    ("CANCEL_PENDING", JobState::Running),
    ("COMPLETED", JobState::Succeeded),
    ("FAILED", JobState::Failed),
    ("CANCELLED", JobState::Cancelled),
    ("INTERRUPTED", JobState::Interrupted),
];

/// Returns the state table for a service
pub fn states_for(kind: ServiceKind) -> &'static [(&'static str, JobState)] {
    match kind {
        ServiceKind::StateMachine => STATE_MACHINE_STATES,
        ServiceKind::ClusterStep => CLUSTER_STEP_STATES,
    }
}

/// Classifies `raw_state` using the vocabulary of the handle's service
pub fn classify(handle: &JobHandle, raw_state: &str) -> Result<JobState> {
    states_for(handle.kind())
        .iter()
        .find(|(name, _)| *name == raw_state)
        .map(|(_, state)| *state)
        .ok_or_else(|| TaskError::UnrecognizedState {
            handle: handle.to_string(),
            state: raw_state.to_string(),
        })
}
