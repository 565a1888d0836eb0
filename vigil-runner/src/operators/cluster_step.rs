//! Cluster step sensor

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;
use vigil_client::RemoteJobClient;
use vigil_core::{JobHandle, Outcome, PollConfig, Result, TaskContext, TriggerEvent};

use super::Task;
use crate::executor::DeferralController;

/// Waits for a step on a compute cluster to complete
///
/// Fails when the step ends cancelled, failed or interrupted. In deferrable
/// mode the sensor suspends before its first status check.
pub struct StepSensor {
    task_id: String,
    cluster_id: String,
    step_id: String,
    poll: PollConfig,
    client: Arc<dyn RemoteJobClient>,
}

impl StepSensor {
    pub fn new(
        task_id: impl Into<String>,
        cluster_id: impl Into<String>,
        step_id: impl Into<String>,
        client: Arc<dyn RemoteJobClient>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            cluster_id: cluster_id.into(),
            step_id: step_id.into(),
            poll: PollConfig::default(),
            client,
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle::cluster_step(&self.cluster_id, &self.step_id)
    }

    fn controller(&self) -> DeferralController {
        DeferralController::new(self.poll.clone())
    }
}

#[async_trait]
impl Task for StepSensor {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<Outcome> {
        info!(
            "Task {} waiting for step {} on cluster {}",
            ctx.task_id, self.step_id, self.cluster_id
        );

        self.controller()
            .drive(Arc::clone(&self.client), self.handle())
            .await
    }

    async fn resume(&self, ctx: &TaskContext, event: TriggerEvent) -> Result<JsonValue> {
        let output = self.controller().resume(event)?;
        info!("Task {} resumed: step {} completed", ctx.task_id, self.step_id);
        Ok(output)
    }
}
