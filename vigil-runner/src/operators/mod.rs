//! Operators and sensors
//!
//! Tasks the engine can schedule. Each one executes in the caller, may ask
//! to be suspended, and is resumed with whatever its trigger delivered.
//!
//! All tasks are trait-based so the engine can hold them as `Arc<dyn Task>`.

mod cluster_step;
mod step_function;

pub use cluster_step::StepSensor;
pub use step_function::{GetExecutionOutputOperator, StartExecutionOperator};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use vigil_core::{Outcome, Result, TaskContext, TriggerEvent};

/// A unit of work scheduled by the engine
#[async_trait]
pub trait Task: Send + Sync {
    fn task_id(&self) -> &str;

    /// Runs the task
    ///
    /// # Returns
    /// `Outcome::Done` with the task output, or `Outcome::Suspend` when the
    /// engine should park the task and schedule the named trigger
    async fn execute(&self, ctx: &TaskContext) -> Result<Outcome>;

    /// Continues a suspended task with its trigger's event
    async fn resume(&self, ctx: &TaskContext, event: TriggerEvent) -> Result<JsonValue>;
}
