//! State machine operators
//!
//! Start an execution (optionally waiting for it, in-process or deferred) and
//! read an execution's output.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;
use vigil_client::{RemoteJobClient, StartRequest};
use vigil_core::{JobHandle, Outcome, PollConfig, Result, TaskContext, TaskError, TriggerEvent};

use super::Task;
use crate::executor::DeferralController;

/// Starts a state machine execution
///
/// Returns the execution ARN. With `wait_for_completion` the task also waits
/// for the execution to succeed; a deferrable poll config hands that wait to
/// the trigger runtime instead.
pub struct StartExecutionOperator {
    task_id: String,
    state_machine_arn: String,
    name: Option<String>,
    input: Option<String>,
    wait_for_completion: bool,
    poll: PollConfig,
    client: Arc<dyn RemoteJobClient>,
}

impl StartExecutionOperator {
    pub fn new(
        task_id: impl Into<String>,
        state_machine_arn: impl Into<String>,
        client: Arc<dyn RemoteJobClient>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            state_machine_arn: state_machine_arn.into(),
            name: None,
            input: None,
            wait_for_completion: false,
            poll: PollConfig::default(),
            client,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the JSON input document
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn wait_for_completion(mut self, wait: bool) -> Self {
        self.wait_for_completion = wait;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn state_machine_arn(&self) -> &str {
        &self.state_machine_arn
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    fn controller(&self) -> DeferralController {
        DeferralController::new(self.poll.clone())
    }

    fn request(&self) -> StartRequest {
        StartRequest {
            state_machine_arn: self.state_machine_arn.clone(),
            name: self.name.clone(),
            input: self.input.clone(),
        }
    }
}

#[async_trait]
impl Task for StartExecutionOperator {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<Outcome> {
        self.poll.validate()?;

        info!(
            "Task {} (try {}) starting execution of {}",
            ctx.task_id, ctx.try_number, self.state_machine_arn
        );

        let handle = self.client.start(&self.request()).await?;
        info!("Started execution {}", handle);

        let execution_arn = JsonValue::String(handle.to_string());

        if !self.poll.deferrable && !self.wait_for_completion {
            return Ok(Outcome::Done(execution_arn));
        }

        match self.controller().drive(Arc::clone(&self.client), handle).await? {
            Outcome::Done(_) => Ok(Outcome::Done(execution_arn)),
            suspended => Ok(suspended),
        }
    }

    async fn resume(&self, ctx: &TaskContext, event: TriggerEvent) -> Result<JsonValue> {
        let execution_arn = match &event {
            TriggerEvent::Completed(snapshot) => JsonValue::String(snapshot.handle.to_string()),
            TriggerEvent::Errored(_) => JsonValue::Null,
        };

        self.controller().resume(event)?;
        info!("Task {} resumed: execution {} succeeded", ctx.task_id, execution_arn);

        Ok(execution_arn)
    }
}

/// Reads the output of a state machine execution
///
/// Returns the `output` document; for executions without one, the `error`
/// reported in its place (the accompanying cause is not part of the output).
/// Never suspends.
pub struct GetExecutionOutputOperator {
    task_id: String,
    execution_arn: String,
    client: Arc<dyn RemoteJobClient>,
}

impl GetExecutionOutputOperator {
    pub fn new(
        task_id: impl Into<String>,
        execution_arn: impl Into<String>,
        client: Arc<dyn RemoteJobClient>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            execution_arn: execution_arn.into(),
            client,
        }
    }

    pub fn execution_arn(&self) -> &str {
        &self.execution_arn
    }
}

#[async_trait]
impl Task for GetExecutionOutputOperator {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<Outcome> {
        let handle = JobHandle::execution(&self.execution_arn);
        info!("Task {} reading output of {}", ctx.task_id, handle);

        let raw = self
            .client
            .describe(&handle)
            .await
            .map_err(|e| e.into_task_error(&handle))?;

        let output = match (raw.output, raw.failure_reason) {
            (Some(JsonValue::String(text)), _) => serde_json::from_str::<JsonValue>(&text).map_err(|e| {
                TaskError::invalid_output(format!("output of {} is not JSON: {}", handle, e))
            })?,
            (Some(document), _) => document,
            (None, Some(reason)) => serde_json::from_str::<JsonValue>(&reason)
                .unwrap_or_else(|_| JsonValue::String(reason)),
            (None, None) => JsonValue::Null,
        };

        Ok(Outcome::Done(output))
    }

    async fn resume(&self, _ctx: &TaskContext, _event: TriggerEvent) -> Result<JsonValue> {
        Err(TaskError::InvalidTransition {
            state: "done".to_string(),
            action: format!("resume {}, which never suspends", self.task_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use vigil_client::{ClientError, InMemoryJobClient};
    use vigil_core::{FailureCode, RawStatus, StatusSnapshot, TriggerKind};

    const EXECUTION_ARN: &str = "arn:aws:states:us-east-1:123456789012:execution:pseudo-state-machine:020f5b16-b1a1-4149-946f-92dd32d97934";
    const STATE_MACHINE_ARN: &str =
        "arn:aws:states:us-east-1:000000000000:stateMachine:pseudo-state-machine";
    const NAME: &str = "NAME";
    const INPUT: &str = "{}";

    fn execution() -> JobHandle {
        JobHandle::execution(EXECUTION_ARN)
    }

    fn start_operator(client: Arc<InMemoryJobClient>) -> StartExecutionOperator {
        StartExecutionOperator::new("step_function_start_execution_task", STATE_MACHINE_ARN, client)
            .with_name(NAME)
            .with_input(INPUT)
    }

    fn ctx() -> TaskContext {
        TaskContext::new("step_function_start_execution_task")
    }

    #[test]
    fn test_start_init() {
        let operator = start_operator(Arc::new(InMemoryJobClient::new()));

        assert_eq!(operator.task_id(), "step_function_start_execution_task");
        assert_eq!(operator.state_machine_arn(), STATE_MACHINE_ARN);
        assert_eq!(operator.name(), Some(NAME));
        assert_eq!(operator.input(), Some(INPUT));
        assert!(!operator.poll().deferrable);
    }

    #[tokio::test]
    async fn test_start_returns_execution_arn() {
        let client = Arc::new(InMemoryJobClient::new());
        client.push_start(execution());

        let outcome = start_operator(client.clone()).execute(&ctx()).await.unwrap();

        assert_eq!(outcome, Outcome::Done(json!(EXECUTION_ARN)));
        let calls = client.start_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].state_machine_arn, STATE_MACHINE_ARN);
        assert_eq!(calls[0].name.as_deref(), Some(NAME));
        assert_eq!(calls[0].input.as_deref(), Some(INPUT));
        assert_eq!(client.describe_count(), 0);
    }

    #[tokio::test]
    async fn test_start_rejected() {
        let client = Arc::new(InMemoryJobClient::new());
        client.push_start_error(ClientError::StartRejected(
            "ExecutionAlreadyExists".to_string(),
        ));

        let err = start_operator(client).execute(&ctx()).await.unwrap_err();
        assert_eq!(err.code(), FailureCode::StartRejected);
    }

    #[tokio::test]
    async fn test_start_deferrable_suspends() {
        let client = Arc::new(InMemoryJobClient::new());
        client.push_start(JobHandle::execution("test-execution-arn"));

        let operator = start_operator(client.clone())
            .with_poll(PollConfig::new(Duration::ZERO).deferrable(true));
        let outcome = operator.execute(&ctx()).await.unwrap();

        match outcome {
            Outcome::Suspend(state) => {
                assert_eq!(state.trigger, TriggerKind::ExecutionCompletion);
                assert_eq!(state.handle, JobHandle::execution("test-execution-arn"));
            }
            other => panic!("expected suspension, got {:?}", other),
        }
        assert_eq!(client.start_calls().len(), 1);
        assert_eq!(client.describe_count(), 0);
    }

    #[tokio::test]
    async fn test_start_and_wait() {
        let client = Arc::new(InMemoryJobClient::new());
        client
            .push_start(execution())
            .push_status(&execution(), RawStatus::new("RUNNING"))
            .push_status(&execution(), RawStatus::new("SUCCEEDED"));

        let operator = start_operator(client.clone())
            .wait_for_completion(true)
            .with_poll(PollConfig::new(Duration::ZERO));
        let outcome = operator.execute(&ctx()).await.unwrap();

        assert_eq!(outcome, Outcome::Done(json!(EXECUTION_ARN)));
        assert_eq!(client.describe_count(), 2);
    }

    #[tokio::test]
    async fn test_start_and_wait_aborted() {
        let client = Arc::new(InMemoryJobClient::new());
        client
            .push_start(execution())
            .push_status(&execution(), RawStatus::new("ABORTED"));

        let operator = start_operator(client)
            .wait_for_completion(true)
            .with_poll(PollConfig::new(Duration::ZERO));
        let err = operator.execute(&ctx()).await.unwrap_err();

        assert_eq!(err.code(), FailureCode::JobCancelled);
    }

    #[tokio::test]
    async fn test_start_resume() {
        let operator = start_operator(Arc::new(InMemoryJobClient::new()));

        let succeeded = StatusSnapshot::from_raw(&execution(), RawStatus::new("SUCCEEDED")).unwrap();
        let arn = operator
            .resume(&ctx(), TriggerEvent::Completed(succeeded))
            .await
            .unwrap();
        assert_eq!(arn, json!(EXECUTION_ARN));

        let failed = StatusSnapshot::from_raw(&execution(), RawStatus::new("TIMED_OUT")).unwrap();
        let err = operator
            .resume(&ctx(), TriggerEvent::Completed(failed))
            .await
            .unwrap_err();
        assert_eq!(err.code(), FailureCode::JobFailed);
    }

    fn output_operator(client: Arc<InMemoryJobClient>) -> GetExecutionOutputOperator {
        GetExecutionOutputOperator::new("step_function_get_execution_output", EXECUTION_ARN, client)
    }

    #[test]
    fn test_output_init() {
        let operator = output_operator(Arc::new(InMemoryJobClient::new()));

        assert_eq!(operator.task_id(), "step_function_get_execution_output");
        assert_eq!(operator.execution_arn(), EXECUTION_ARN);
    }

    #[tokio::test]
    async fn test_output_reads_output_or_error() {
        for field in ["output", "error"] {
            let client = Arc::new(InMemoryJobClient::new());
            let state = if field == "output" { "SUCCEEDED" } else { "FAILED" };
            client
                .push_document(&execution(), &json!({"status": state, field: "{}"}))
                .unwrap();

            let outcome = output_operator(client.clone())
                .execute(&ctx())
                .await
                .unwrap();

            assert_eq!(outcome, Outcome::Done(json!({})), "reading {}", field);
            assert_eq!(client.describe_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_output_error_ignores_cause() {
        let client = Arc::new(InMemoryJobClient::new());
        client
            .push_document(
                &execution(),
                &json!({"status": "FAILED", "error": "{}", "cause": "boom"}),
            )
            .unwrap();

        let outcome = output_operator(client).execute(&ctx()).await.unwrap();
        assert_eq!(outcome, Outcome::Done(json!({})));
    }

    #[tokio::test]
    async fn test_output_plain_error_name() {
        let client = Arc::new(InMemoryJobClient::new());
        client
            .push_document(
                &execution(),
                &json!({"status": "FAILED", "error": "States.TaskFailed"}),
            )
            .unwrap();

        let outcome = output_operator(client).execute(&ctx()).await.unwrap();
        assert_eq!(outcome, Outcome::Done(json!("States.TaskFailed")));
    }

    #[tokio::test]
    async fn test_output_without_fields_is_null() {
        let client = Arc::new(InMemoryJobClient::new());
        client.push_status(&execution(), RawStatus::new("RUNNING"));

        let outcome = output_operator(client).execute(&ctx()).await.unwrap();
        assert_eq!(outcome, Outcome::Done(JsonValue::Null));
    }

    #[tokio::test]
    async fn test_output_not_json() {
        let client = Arc::new(InMemoryJobClient::new());
        client
            .push_document(
                &execution(),
                &json!({"status": "SUCCEEDED", "output": "not json"}),
            )
            .unwrap();

        let err = output_operator(client).execute(&ctx()).await.unwrap_err();
        assert_eq!(err.code(), FailureCode::InvalidOutput);
    }

    #[tokio::test]
    async fn test_output_unknown_execution() {
        let err = output_operator(Arc::new(InMemoryJobClient::new()))
            .execute(&ctx())
            .await
            .unwrap_err();

        assert_eq!(err.code(), FailureCode::JobNotFound);
    }

    #[tokio::test]
    async fn test_output_never_resumes() {
        let operator = output_operator(Arc::new(InMemoryJobClient::new()));
        let event = TriggerEvent::Errored(TaskError::invalid_output("x"));

        let err = operator.resume(&ctx(), event).await.unwrap_err();
        assert_eq!(err.code(), FailureCode::InvalidTransition);
    }
}
