//! Deferral controller
//!
//! Chooses, from the task's poll configuration, whether a job is polled in
//! the current call or handed to the trigger runtime. Suspension happens
//! before any status check; the resumed side resolves the delivered snapshot
//! with the same rules the in-process loop uses.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_client::RemoteJobClient;
use vigil_core::{DeferralState, JobHandle, Outcome, PollConfig, Result, TriggerEvent};

use super::polling::PollingExecutor;

/// Runs a job's wait either in-process or through a trigger
#[derive(Debug, Clone)]
pub struct DeferralController {
    config: PollConfig,
}

impl DeferralController {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn is_deferrable(&self) -> bool {
        self.config.deferrable
    }

    /// Builds the suspension for `handle` without checking its status
    pub fn suspend(&self, handle: JobHandle) -> Result<Outcome> {
        self.config.validate()?;

        let state = DeferralState::new(handle, self.config.clone())?;
        info!(
            "Deferring {} to trigger {:?}",
            state.handle, state.trigger
        );

        Ok(Outcome::Suspend(state))
    }

    /// Waits for `handle` to finish
    ///
    /// Deferrable configurations return `Outcome::Suspend` immediately. All
    /// others poll to completion on the calling task.
    pub async fn drive(
        &self,
        client: Arc<dyn RemoteJobClient>,
        handle: JobHandle,
    ) -> Result<Outcome> {
        if self.is_deferrable() {
            return self.suspend(handle);
        }

        let mut executor = PollingExecutor::new(client, self.config.clone());
        executor.start(handle)?;
        let output = executor.run_to_completion().await?;

        Ok(Outcome::Done(output))
    }

    /// Resolves the event a trigger delivered for a suspended task
    pub fn resume(&self, event: TriggerEvent) -> Result<JsonValue> {
        match event {
            TriggerEvent::Completed(snapshot) => {
                info!(
                    "Resuming after {} reached {}",
                    snapshot.handle, snapshot.raw_state
                );
                snapshot.into_result()
            }
            TriggerEvent::Errored(err) => {
                warn!("Resuming after trigger error: {}", err);
                Err(err)
            }
        }
    }
}
