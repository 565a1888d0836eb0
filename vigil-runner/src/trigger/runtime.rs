//! Trigger runtime
//!
//! Runs deferred polls for suspended tasks. Each submission becomes its own
//! tokio task, gated by a semaphore, and produces exactly one delivery on the
//! runtime's channel. A task id may only have one trigger in flight, from
//! submission until its delivery is received.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vigil_client::RemoteJobClient;
use vigil_core::{DeferralState, Result, TaskError, TriggerEvent};

use super::status::StatusTrigger;
use crate::config::RuntimeConfig;

/// Event produced for a suspended task
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDelivery {
    pub task_id: String,
    pub event: TriggerEvent,
}

/// Runs triggers concurrently and hands their events back to the engine
pub struct TriggerRuntime {
    client: Arc<dyn RemoteJobClient>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    sender: mpsc::Sender<TriggerDelivery>,
    receiver: mpsc::Receiver<TriggerDelivery>,
}

impl TriggerRuntime {
    /// Creates a new trigger runtime
    pub fn new(client: Arc<dyn RemoteJobClient>, config: RuntimeConfig) -> anyhow::Result<Self> {
        config.validate()?;

        info!(
            "Starting trigger runtime (max concurrent triggers: {})",
            config.max_concurrent_triggers
        );

        let (sender, receiver) = mpsc::channel(config.delivery_buffer);

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_triggers)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            sender,
            receiver,
        })
    }

    /// Schedules the trigger for a suspended task
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        task_id: impl Into<String>,
        state: DeferralState,
    ) -> Result<JoinHandle<()>> {
        let task_id = task_id.into();

        if !lock(&self.in_flight).insert(task_id.clone()) {
            return Err(TaskError::InvalidTransition {
                state: "deferred".to_string(),
                action: format!("submit a second trigger for task {}", task_id),
            });
        }

        debug!(
            "Queued {:?} trigger for task {} ({})",
            state.trigger, task_id, state.handle
        );

        let client = Arc::clone(&self.client);
        let semaphore = Arc::clone(&self.semaphore);
        let in_flight = Arc::clone(&self.in_flight);
        let sender = self.sender.clone();

        Ok(tokio::spawn(async move {
            // Permit is released when dropped
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Trigger for task {} could not run: {}", task_id, e);
                    lock(&in_flight).remove(&task_id);
                    return;
                }
            };

            let event = StatusTrigger::new(client, state).run().await;
            info!("Trigger for task {} finished", task_id);

            let delivery = TriggerDelivery {
                task_id: task_id.clone(),
                event,
            };
            if sender.send(delivery).await.is_err() {
                warn!("Delivery channel closed, dropping event for task {}", task_id);
                lock(&in_flight).remove(&task_id);
            }
        }))
    }

    /// Waits for the next finished trigger
    ///
    /// The delivered task id is released here, so it cannot be submitted
    /// again while its event is still queued.
    pub async fn next_delivery(&mut self) -> Option<TriggerDelivery> {
        let delivery = self.receiver.recv().await?;
        lock(&self.in_flight).remove(&delivery.task_id);
        Some(delivery)
    }

    /// Number of triggers whose event has not been received yet
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

fn lock(in_flight: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    in_flight
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
