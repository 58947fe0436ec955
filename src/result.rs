//! Structured outcome of a single test run.

use serde::{Deserialize, Serialize};

/// Final state of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestState {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of a single test case within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub name: String,
    pub state: TestState,
    /// Captured failure output, when the runner printed any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestCaseResult {
    pub fn new(name: impl Into<String>, state: TestState) -> Self {
        Self {
            name: name.into(),
            state,
            message: None,
        }
    }
}

/// Pass/fail/skip counts reported by an execution service.
///
/// `total == passed + failed + skipped` is the producer's contract. Values are
/// carried verbatim; nothing downstream recomputes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunResult {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
    /// Wall-clock time the runner reported for the whole run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Overall verdict the runner reported (`passed` or `failed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_state: Option<TestState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TestCaseResult>,
}

impl TestRunResult {
    /// Counts only, with no per-case detail.
    pub fn from_counts(passed: u32, failed: u32, skipped: u32, total: u32) -> Self {
        Self {
            passed,
            failed,
            skipped,
            total,
            ..Self::default()
        }
    }

    /// Derive counts from a list of case results.
    pub fn from_cases(results: Vec<TestCaseResult>) -> Self {
        let count = |state| {
            let n = results.iter().filter(|r| r.state == state).count();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        let passed = count(TestState::Passed);
        let failed = count(TestState::Failed);
        let skipped = count(TestState::Skipped);
        Self {
            passed,
            failed,
            skipped,
            total: passed.saturating_add(failed).saturating_add(skipped),
            results,
            ..Self::default()
        }
    }
}
