//! Provider status documents
//!
//! Reads the `describe` responses of the supported services into a
//! [`RawStatus`]. Only the fields the executor passes through are picked out;
//! their contents are left as the service wrote them.

use serde_json::Value as JsonValue;
use vigil_core::{JobHandle, RawStatus, ServiceKind};

use crate::error::{ClientError, Result};

/// Reads a state machine execution description
///
/// Expects `status`. `output` is kept as text; `error` becomes the failure
/// reason and `cause` its detail.
pub fn execution_status(doc: &JsonValue) -> Result<RawStatus> {
    let state = doc
        .get("status")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| ClientError::InvalidResponse("execution has no status".to_string()))?;

    let mut raw = RawStatus::new(state);
    raw.output = doc
        .get("output")
        .and_then(JsonValue::as_str)
        .map(|text| JsonValue::String(text.to_string()));
    raw.failure_reason = doc
        .get("error")
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    raw.failure_cause = doc
        .get("cause")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    Ok(raw)
}

/// Reads a cluster step description
///
/// Expects `Step.Status.State`; failure details are optional.
pub fn step_status(doc: &JsonValue) -> Result<RawStatus> {
    let status = doc
        .pointer("/Step/Status")
        .ok_or_else(|| ClientError::InvalidResponse("step has no status".to_string()))?;

    let state = status
        .get("State")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| ClientError::InvalidResponse("step status has no state".to_string()))?;

    let mut raw = RawStatus::new(state);
    if let Some(details) = status.get("FailureDetails") {
        raw.failure_reason = details
            .get("Reason")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        raw.log_uri = details
            .get("LogFile")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
    }

    Ok(raw)
}

/// Reads a document using the vocabulary of the handle's service
pub fn status_for(handle: &JobHandle, doc: &JsonValue) -> Result<RawStatus> {
    match handle.kind() {
        ServiceKind::StateMachine => execution_status(doc),
        ServiceKind::ClusterStep => step_status(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step_document(state: &str) -> JsonValue {
        json!({
            "ResponseMetadata": {"HTTPStatusCode": 200},
            "Step": {
                "ActionOnFailure": "CONTINUE",
                "Id": "s-VK57YR1Z9Z5N",
                "Name": "calculate_pi",
                "Status": {
                    "State": state,
                    "StateChangeReason": {}
                }
            }
        })
    }

    #[test]
    fn test_step_status_running() {
        let raw = step_status(&step_document("RUNNING")).unwrap();
        assert_eq!(raw.state, "RUNNING");
        assert!(raw.failure_reason.is_none());
        assert!(raw.log_uri.is_none());
    }

    #[test]
    fn test_step_status_failure_details() {
        let mut doc = step_document("FAILED");
        doc["Step"]["Status"]["FailureDetails"] = json!({
            "LogFile": "s3://fake-log-files/emr-logs/j-8989898989/steps/s-VK57YR1Z9Z5N",
            "Reason": "Unknown Error."
        });

        let raw = step_status(&doc).unwrap();
        assert_eq!(raw.state, "FAILED");
        assert_eq!(raw.failure_reason.as_deref(), Some("Unknown Error."));
        assert_eq!(
            raw.log_uri.as_deref(),
            Some("s3://fake-log-files/emr-logs/j-8989898989/steps/s-VK57YR1Z9Z5N")
        );
    }

    #[test]
    fn test_step_without_state_is_invalid() {
        let err = step_status(&json!({"Step": {"Status": {}}})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));

        let err = step_status(&json!({})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_execution_status_passes_output_through() {
        let raw = execution_status(&json!({
            "executionArn": "arn:exec",
            "status": "SUCCEEDED",
            "output": "{\"rows\": 3}"
        }))
        .unwrap();

        assert_eq!(raw.state, "SUCCEEDED");
        assert_eq!(raw.output, Some(JsonValue::String("{\"rows\": 3}".to_string())));
    }

    #[test]
    fn test_execution_status_error_fields() {
        let raw = execution_status(&json!({
            "status": "FAILED",
            "error": "States.TaskFailed",
            "cause": "Lambda returned 500"
        }))
        .unwrap();

        assert_eq!(raw.failure_reason.as_deref(), Some("States.TaskFailed"));
        assert_eq!(raw.failure_cause.as_deref(), Some("Lambda returned 500"));
        assert!(raw.log_uri.is_none());
    }

    #[test]
    fn test_status_for_dispatches_on_handle() {
        let step = JobHandle::cluster_step("j-1", "s-1");
        assert_eq!(
            status_for(&step, &step_document("COMPLETED")).unwrap().state,
            "COMPLETED"
        );

        let execution = JobHandle::execution("arn:exec");
        assert!(status_for(&execution, &step_document("COMPLETED")).is_err());
    }
}
