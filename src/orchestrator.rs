//! Single-test-run orchestrator.
//!
//! Starts one run on a [`TestExecutionService`] and races it against a
//! watchdog timer. Whichever finishes first decides the outcome. A run that
//! loses the race is detached, not aborted: the underlying runner may keep
//! going after a timeout has been reported.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::RunError;
use crate::mode::RunMode;
use crate::result::TestRunResult;
use crate::service::TestExecutionService;

/// Timeout applied when the caller supplies none, zero, or a negative value.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub const TEST_NAME_REQUIRED: &str = "testName parameter is required";

/// Successful outcome of [`TestRunOrchestrator::run_single_test`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunReport {
    pub message: String,
    pub mode: RunMode,
    pub result: TestRunResult,
}

#[derive(Clone)]
pub struct TestRunOrchestrator {
    service: Arc<dyn TestExecutionService>,
    default_timeout_secs: u64,
}

impl TestRunOrchestrator {
    pub fn new(service: Arc<dyn TestExecutionService>) -> Self {
        Self {
            service,
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the fallback timeout. Zero keeps the built-in default.
    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.default_timeout_secs = secs;
        }
        self
    }

    /// Timeout actually used for a requested value.
    pub fn effective_timeout(&self, requested: Option<i64>) -> u64 {
        match requested {
            Some(secs) if secs > 0 => secs as u64,
            _ => self.default_timeout_secs,
        }
    }

    /// Run exactly one test, failing with [`RunError::Timeout`] if it has not
    /// completed within the effective timeout.
    pub async fn run_single_test(
        &self,
        mode: RunMode,
        test_name: &str,
        timeout_secs: Option<i64>,
    ) -> Result<TestRunReport, RunError> {
        if test_name.trim().is_empty() {
            return Err(RunError::InvalidArgument(TEST_NAME_REQUIRED.to_string()));
        }
        let seconds = self.effective_timeout(timeout_secs);

        let run = self
            .service
            .start(mode, test_name)
            .await
            .map_err(|e| RunError::StartFailure(format!("{:#}", e)))?;

        // Spawned so the run keeps its own schedule once the watchdog wins.
        let mut run_task = tokio::spawn(run);
        let watchdog = tokio::time::sleep(Duration::from_secs(seconds));
        tokio::pin!(watchdog);

        let joined = tokio::select! {
            biased;

            joined = &mut run_task => joined,

            _ = &mut watchdog => {
                return Err(RunError::Timeout { seconds });
            }
        };

        let result = match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return Err(RunError::ExecutionFailure(format!("{:#}", e))),
            Err(e) => {
                return Err(RunError::ExecutionFailure(format!(
                    "test run task failed: {}",
                    e
                )))
            }
        };

        Ok(TestRunReport {
            message: summary_message(mode, test_name, &result),
            mode,
            result,
        })
    }
}

/// Human-readable one-line summary of a completed run.
pub fn summary_message(mode: RunMode, test_name: &str, result: &TestRunResult) -> String {
    format!(
        "{} test '{}' completed: {}/{} passed, {} failed, {} skipped",
        mode, test_name, result.passed, result.total, result.failed, result.skipped
    )
}
