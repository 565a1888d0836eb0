//! Engine-facing task types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::deferral::DeferralState;

/// Identifies one run of a task instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: String,
    pub run_id: Uuid,
    pub try_number: u32,
}

impl TaskContext {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            run_id: Uuid::new_v4(),
            try_number: 1,
        }
    }
}

/// Result of executing a task
///
/// Fatal conditions travel on the `Err` side of the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Finished in this call
    Done(JsonValue),
    /// Suspend the task and schedule the trigger named by the state
    Suspend(DeferralState),
}

impl Outcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspend(_))
    }
}
