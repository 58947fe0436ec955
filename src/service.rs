//! Capability interface to an external test runner.

use anyhow::Result;
use futures::future::BoxFuture;

use crate::mode::RunMode;
use crate::result::TestRunResult;

/// An in-flight test run. Resolves once the runner has finished.
pub type RunFuture = BoxFuture<'static, Result<TestRunResult>>;

/// Trait for anything that can execute a single named test.
///
/// Starting and running are separate failure points: `start` fails when the
/// run cannot even begin, the returned future fails when the run itself does.
#[async_trait::async_trait]
pub trait TestExecutionService: Send + Sync {
    /// Begin running `test_name` under `mode`.
    async fn start(&self, mode: RunMode, test_name: &str) -> Result<RunFuture>;
}
