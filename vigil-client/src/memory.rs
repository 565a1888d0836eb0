//! In-memory remote job client
//!
//! A scripted stand-in for a remote service. Start responses and per-handle
//! status sequences are queued up front; every call is recorded so tests can
//! assert on how the service was used.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use vigil_core::{JobHandle, RawStatus};

use crate::documents;
use crate::error::{ClientError, Result};
use crate::{RemoteJobClient, StartRequest};

#[derive(Default)]
struct Script {
    starts: VecDeque<Result<JobHandle>>,
    statuses: HashMap<JobHandle, VecDeque<Result<RawStatus>>>,
    start_calls: Vec<StartRequest>,
    describe_calls: Vec<JobHandle>,
}

/// In-memory implementation of RemoteJobClient
///
/// The last queued status of a handle is sticky: once the queue is down to
/// one entry, every further `describe` returns it again.
#[derive(Default)]
pub struct InMemoryJobClient {
    script: Mutex<Script>,
}

impl InMemoryJobClient {
    /// Creates a client with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues the handle returned by the next `start`
    pub fn push_start(&self, handle: JobHandle) -> &Self {
        self.script().starts.push_back(Ok(handle));
        self
    }

    /// Queues a rejection for the next `start`
    pub fn push_start_error(&self, err: ClientError) -> &Self {
        self.script().starts.push_back(Err(err));
        self
    }

    /// Queues a status for `handle`
    pub fn push_status(&self, handle: &JobHandle, status: RawStatus) -> &Self {
        self.script()
            .statuses
            .entry(handle.clone())
            .or_default()
            .push_back(Ok(status));
        self
    }

    /// Queues a provider document for `handle`, read with the handle's vocabulary
    pub fn push_document(&self, handle: &JobHandle, doc: &JsonValue) -> Result<&Self> {
        let status = documents::status_for(handle, doc)?;
        Ok(self.push_status(handle, status))
    }

    /// Queues a failing `describe` for `handle`
    pub fn push_status_error(&self, handle: &JobHandle, err: ClientError) -> &Self {
        self.script()
            .statuses
            .entry(handle.clone())
            .or_default()
            .push_back(Err(err));
        self
    }

    /// Requests passed to `start`, in call order
    pub fn start_calls(&self) -> Vec<StartRequest> {
        self.script().start_calls.clone()
    }

    /// Handles passed to `describe`, in call order
    pub fn describe_calls(&self) -> Vec<JobHandle> {
        self.script().describe_calls.clone()
    }

    pub fn describe_count(&self) -> usize {
        self.script().describe_calls.len()
    }
}

#[async_trait]
impl RemoteJobClient for InMemoryJobClient {
    async fn start(&self, request: &StartRequest) -> Result<JobHandle> {
        let mut script = self.script();
        script.start_calls.push(request.clone());

        debug!("Starting execution of {}", request.state_machine_arn);

        script.starts.pop_front().unwrap_or_else(|| {
            Err(ClientError::Internal(
                "no start response scripted".to_string(),
            ))
        })
    }

    async fn describe(&self, handle: &JobHandle) -> Result<RawStatus> {
        let mut script = self.script();
        script.describe_calls.push(handle.clone());

        let queue = script
            .statuses
            .get_mut(handle)
            .ok_or_else(|| ClientError::NotFound(handle.to_string()))?;

        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        next.unwrap_or_else(|| Err(ClientError::NotFound(handle.to_string())))
    }
}
