//! Status trigger
//!
//! The out-of-process half of a deferred task: rebuilds the executor from the
//! continuation and waits for a terminal state, yielding once per interval.

use std::sync::Arc;
use tracing::debug;
use vigil_client::RemoteJobClient;
use vigil_core::{DeferralState, TriggerEvent, TriggerKind};

use crate::executor::PollingExecutor;

/// Polls one deferred job until it is terminal
pub struct StatusTrigger {
    kind: TriggerKind,
    executor: PollingExecutor,
}

impl StatusTrigger {
    pub fn new(client: Arc<dyn RemoteJobClient>, state: DeferralState) -> Self {
        Self {
            kind: state.trigger,
            executor: PollingExecutor::from_deferral(client, state),
        }
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Runs to a single event
    ///
    /// Terminal snapshots are delivered unresolved; the resumed task decides
    /// what they mean.
    pub async fn run(mut self) -> TriggerEvent {
        let interval = self.executor.config().interval;

        loop {
            match self.executor.check().await {
                Ok(snapshot) if snapshot.is_terminal() => {
                    return TriggerEvent::Completed(snapshot);
                }
                Ok(snapshot) => {
                    debug!(
                        "{:?} trigger: {} is {}, next check in {:?}",
                        self.kind, snapshot.handle, snapshot.raw_state, interval
                    );
                    tokio::time::sleep(interval).await;
                }
                Err(e) => return TriggerEvent::Errored(e),
            }
        }
    }
}
