//! Polling executor
//!
//! Drives a started job to a terminal state by repeatedly describing it.
//!
//! ```text
//! STARTING --start(handle)--> POLLING --terminal success--> SUCCEEDED
//!                                 \------any failure------> FAILED
//! ```
//!
//! Each `poll()` issues exactly one `describe`. The handle is fixed by
//! `start()` and never re-derived afterwards.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigil_client::RemoteJobClient;
use vigil_core::{
    DeferralState, JobHandle, PollConfig, Result, StatusSnapshot, TaskError, TriggerKind,
};

/// Lifecycle of a polling executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Starting,
    Polling,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a single successful `poll()`
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Job is still pending or running
    Continue(StatusSnapshot),
    /// Job succeeded with this output
    Finished(JsonValue),
}

/// Polls one remote job until it is terminal
pub struct PollingExecutor {
    client: Arc<dyn RemoteJobClient>,
    config: PollConfig,
    state: ExecutorState,
    handle: Option<JobHandle>,
    attempts: u32,
    deadline: Option<chrono::DateTime<chrono::Utc>>,
}

impl PollingExecutor {
    /// Creates an executor in the STARTING state
    pub fn new(client: Arc<dyn RemoteJobClient>, config: PollConfig) -> Self {
        Self {
            client,
            config,
            state: ExecutorState::Starting,
            handle: None,
            attempts: 0,
            deadline: None,
        }
    }

    /// Rebuilds a POLLING executor from a deferred continuation
    pub fn from_deferral(client: Arc<dyn RemoteJobClient>, deferral: DeferralState) -> Self {
        Self {
            client,
            config: deferral.poll,
            state: ExecutorState::Polling,
            handle: Some(deferral.handle),
            attempts: deferral.attempts_made,
            deadline: deferral.deadline,
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn handle(&self) -> Option<&JobHandle> {
        self.handle.as_ref()
    }

    /// Status checks issued so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Attaches the job to poll and moves to POLLING
    pub fn start(&mut self, handle: JobHandle) -> Result<()> {
        self.expect_state(ExecutorState::Starting, "start")?;
        self.config.validate()?;
        self.deadline = self.config.deadline_from(chrono::Utc::now())?;

        info!("Polling {} every {:?}", handle, self.config.interval);

        self.handle = Some(handle);
        self.state = ExecutorState::Polling;
        Ok(())
    }

    /// Checks the job once and returns the classified snapshot
    ///
    /// Terminal snapshots are returned as-is, leaving their resolution to the
    /// caller. Not-found, unclassifiable states and an exhausted poll bound
    /// fail the executor.
    pub async fn check(&mut self) -> Result<StatusSnapshot> {
        self.expect_state(ExecutorState::Polling, "poll")?;
        let handle = self.current_handle()?.clone();

        // A rebuilt executor may arrive with its attempts already spent
        if self.attempts_spent() {
            return Err(self.fail(TaskError::PollTimeout {
                handle: handle.to_string(),
                attempts: self.attempts,
            }));
        }

        self.attempts += 1;
        debug!("Checking status of {} (attempt {})", handle, self.attempts);

        let raw = match self.client.describe(&handle).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.fail(e.into_task_error(&handle))),
        };

        let snapshot = match StatusSnapshot::from_raw(&handle, raw) {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail(e)),
        };

        if !snapshot.is_terminal() && self.bound_exceeded() {
            return Err(self.fail(TaskError::PollTimeout {
                handle: handle.to_string(),
                attempts: self.attempts,
            }));
        }

        Ok(snapshot)
    }

    /// Checks the job once and resolves terminal states
    pub async fn poll(&mut self) -> Result<PollStep> {
        let snapshot = self.check().await?;

        if !snapshot.is_terminal() {
            debug!("Job {} is {}", snapshot.handle, snapshot.raw_state);
            return Ok(PollStep::Continue(snapshot));
        }

        let handle = snapshot.handle.clone();
        match snapshot.into_result() {
            Ok(output) => {
                info!(
                    "Job {} succeeded after {} status check(s)",
                    handle, self.attempts
                );
                self.state = ExecutorState::Succeeded;
                Ok(PollStep::Finished(output))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Polls until the job is terminal, sleeping `interval` in between
    ///
    /// Holds the calling task for the whole wait.
    pub async fn run_to_completion(&mut self) -> Result<JsonValue> {
        loop {
            match self.poll().await? {
                PollStep::Finished(output) => return Ok(output),
                PollStep::Continue(_) => tokio::time::sleep(self.config.interval).await,
            }
        }
    }

    /// Captures a continuation that resumes polling the same job elsewhere
    pub fn to_deferral(&self) -> Result<DeferralState> {
        self.expect_state(ExecutorState::Polling, "defer")?;
        let handle = self.current_handle()?.clone();

        Ok(DeferralState {
            trigger: TriggerKind::for_handle(&handle),
            handle,
            poll: self.config.clone(),
            attempts_made: self.attempts,
            deadline: self.deadline,
        })
    }

    fn attempts_spent(&self) -> bool {
        self.config
            .max_attempts
            .is_some_and(|max| self.attempts >= max)
    }

    fn bound_exceeded(&self) -> bool {
        let past_deadline = self
            .deadline
            .is_some_and(|deadline| chrono::Utc::now() >= deadline);

        self.attempts_spent() || past_deadline
    }

    fn current_handle(&self) -> Result<&JobHandle> {
        self.handle.as_ref().ok_or_else(|| TaskError::InvalidTransition {
            state: self.state.to_string(),
            action: "poll without a job handle".to_string(),
        })
    }

    fn expect_state(&self, expected: ExecutorState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(TaskError::InvalidTransition {
                state: self.state.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn fail(&mut self, err: TaskError) -> TaskError {
        warn!("Polling failed ({}): {}", err.code(), err);
        self.state = ExecutorState::Failed;
        err
    }
}
