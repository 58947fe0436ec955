//! `run_single_test` command handler.
//!
//! Takes the loosely-typed JSON parameter object sent by an RPC client,
//! applies defaults, runs the orchestrator and shapes the response.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RunError;
use crate::mode::RunMode;
use crate::orchestrator::{TestRunOrchestrator, TEST_NAME_REQUIRED};
use crate::result::{TestCaseResult, TestState};

pub const COMMAND_NAME: &str = "run_single_test";

/// Mode used when the request carries none.
pub const DEFAULT_MODE: RunMode = RunMode::Play;

/// Success payload returned to the RPC client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSingleTestResponse {
    pub message: String,
    pub mode: RunMode,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_state: Option<TestState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TestCaseResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Success(RunSingleTestResponse),
    Failure { error: String },
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResponse::Success(_))
    }
}

impl From<Result<RunSingleTestResponse, RunError>> for CommandResponse {
    fn from(outcome: Result<RunSingleTestResponse, RunError>) -> Self {
        match outcome {
            Ok(response) => CommandResponse::Success(response),
            Err(e) => CommandResponse::Failure {
                error: e.to_string(),
            },
        }
    }
}

/// Run the command and return the wire response.
pub async fn dispatch(orchestrator: &TestRunOrchestrator, params: &Value) -> CommandResponse {
    handle(orchestrator, params).await.into()
}

/// Run the command, keeping the typed error.
///
/// `testName` is checked first, then `mode`; neither failure reaches the
/// execution service. A missing, unparseable or non-positive `timeoutSeconds`
/// falls back to the orchestrator's default.
pub async fn handle(
    orchestrator: &TestRunOrchestrator,
    params: &Value,
) -> Result<RunSingleTestResponse, RunError> {
    let test_name = string_param(params, &["testName", "test_name"])
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| RunError::InvalidArgument(TEST_NAME_REQUIRED.to_string()))?;

    let mode = match string_param(params, &["mode"]) {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<RunMode>()?,
        _ => DEFAULT_MODE,
    };

    let timeout = timeout_param(params, &["timeoutSeconds", "timeout_seconds"]);
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        test_name = test_name.as_str(),
        mode = mode.as_str(),
        timeout_secs = orchestrator.effective_timeout(timeout),
        "{} requested",
        COMMAND_NAME
    );

    match orchestrator.run_single_test(mode, &test_name, timeout).await {
        Ok(report) => {
            info!(%request_id, message = report.message.as_str(), "test run completed");
            Ok(RunSingleTestResponse {
                message: report.message,
                mode: report.mode,
                passed: report.result.passed,
                failed: report.result.failed,
                skipped: report.result.skipped,
                total: report.result.total,
                duration_seconds: report.result.duration_seconds,
                result_state: report.result.result_state,
                results: report.result.results,
            })
        }
        Err(e) => {
            warn!(%request_id, kind = e.kind(), error = %e, "test run failed");
            Err(e)
        }
    }
}

/// First present, non-null value among `keys`, rendered as a string.
fn string_param(params: &Value, keys: &[&str]) -> Option<String> {
    match keys.iter().find_map(|k| params.get(*k))? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn timeout_param(params: &Value, keys: &[&str]) -> Option<i64> {
    match keys.iter().find_map(|k| params.get(*k))? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_param_aliases() {
        let params = json!({ "test_name": "Foo" });
        assert_eq!(
            string_param(&params, &["testName", "test_name"]).as_deref(),
            Some("Foo")
        );
        assert_eq!(string_param(&json!({ "testName": null }), &["testName"]), None);
        assert_eq!(
            string_param(&json!({ "testName": 42 }), &["testName"]).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_timeout_param_is_lenient() {
        let keys = ["timeoutSeconds"];
        assert_eq!(timeout_param(&json!({ "timeoutSeconds": 30 }), &keys), Some(30));
        assert_eq!(timeout_param(&json!({ "timeoutSeconds": " 12 " }), &keys), Some(12));
        assert_eq!(timeout_param(&json!({ "timeoutSeconds": "soon" }), &keys), None);
        assert_eq!(timeout_param(&json!({ "timeoutSeconds": 1.5 }), &keys), None);
        assert_eq!(timeout_param(&json!({}), &keys), None);
    }

    #[test]
    fn test_failure_serializes_as_error_object() {
        let response = CommandResponse::from(Err::<RunSingleTestResponse, _>(
            RunError::Timeout { seconds: 5 },
        ));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "error": "Test run timed out after 5 seconds" })
        );
    }
}
