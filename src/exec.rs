//! Process-backed test execution service.
//!
//! Runs the configured test command for a mode as a child process and parses
//! libtest-style output into a [`TestRunResult`]. Only one run may be in
//! flight at a time.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::mode::RunMode;
use crate::result::{TestCaseResult, TestRunResult, TestState};
use crate::service::{RunFuture, TestExecutionService};

/// Execution service that shells out to an external test command.
pub struct CommandService {
    runner: RunnerConfig,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the run finishes or is dropped.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CommandService {
    pub fn new(runner: RunnerConfig) -> Self {
        Self {
            runner,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            anyhow::bail!("a test run is already in progress");
        }
        Ok(BusyGuard(self.busy.clone()))
    }
}

#[async_trait::async_trait]
impl TestExecutionService for CommandService {
    async fn start(&self, mode: RunMode, test_name: &str) -> Result<RunFuture> {
        let cmd = self.runner.command_for(mode).ok_or_else(|| {
            anyhow::anyhow!("no test command configured for {} mode", mode.as_str())
        })?;

        validate_test_name(test_name)?;
        let guard = self.acquire()?;

        let args = cmd.render_args(test_name);
        let mut command = Command::new(&cmd.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &cmd.working_dir {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn test command '{}'", cmd.program))?;

        info!(
            mode = mode.as_str(),
            test_name,
            program = cmd.program.as_str(),
            pid = child.id(),
            "test command started"
        );

        let test_name = test_name.to_string();
        Ok(async move {
            let _guard = guard;
            collect(child, &test_name).await
        }
        .boxed())
    }
}

/// Reject names the test command would read as options, and names that
/// cannot travel as a single argument.
fn validate_test_name(test_name: &str) -> Result<()> {
    if test_name.trim_start().starts_with('-') || test_name.chars().any(char::is_control) {
        anyhow::bail!("invalid test name '{}'", test_name.escape_debug());
    }
    Ok(())
}

/// Wait for the child and turn its output into a result.
async fn collect(child: Child, test_name: &str) -> Result<TestRunResult> {
    let output = child
        .wait_with_output()
        .await
        .context("failed to wait for test command")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!(test_name, status = %output.status, "test command exited");

    match parse_libtest_output(&stdout) {
        Some(result) => {
            info!(
                test_name,
                passed = result.passed,
                failed = result.failed,
                skipped = result.skipped,
                "test command finished"
            );
            Ok(result)
        }
        None if output.status.success() => {
            warn!(test_name, "test command succeeded without reporting any results");
            Ok(TestRunResult::default())
        }
        None => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("test command failed ({}): {}", output.status, tail(&stderr, 3))
        }
    }
}

/// Parse libtest output.
///
/// Per-case lines (`test name ... ok`) are preferred, with each failing case
/// picking up its `---- name stdout ----` block as its message. When there
/// are none, the `test result:` summary lines are summed. Run duration and
/// verdict always come from the summary lines. Returns `None` when the output
/// contains neither.
pub fn parse_libtest_output(output: &str) -> Option<TestRunResult> {
    let summary = parse_summary_lines(output);
    let mut cases: Vec<TestCaseResult> = output.lines().filter_map(parse_case_line).collect();
    if cases.is_empty() {
        return summary;
    }

    let mut messages = parse_failure_blocks(output);
    for case in cases.iter_mut().filter(|c| c.state == TestState::Failed) {
        case.message = messages.remove(case.name.as_str());
    }

    let mut result = TestRunResult::from_cases(cases);
    if let Some(summary) = summary {
        result.duration_seconds = summary.duration_seconds;
        result.result_state = summary.result_state;
    }
    Some(result)
}

/// Sum every `test result:` line. A test binary per line, so durations add up
/// and any `FAILED` verdict fails the run.
fn parse_summary_lines(output: &str) -> Option<TestRunResult> {
    let mut summary: Option<TestRunResult> = None;
    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("test result:") else {
            continue;
        };
        let acc = summary.get_or_insert_with(TestRunResult::default);

        let verdict = match rest.split_whitespace().next() {
            Some(word) if word.starts_with("FAILED") => Some(TestState::Failed),
            Some(word) if word.starts_with("ok") => Some(TestState::Passed),
            _ => None,
        };
        if let Some(verdict) = verdict {
            if acc.result_state != Some(TestState::Failed) {
                acc.result_state = Some(verdict);
            }
        }

        for part in rest.split(';') {
            let words: Vec<&str> = part.split_whitespace().collect();
            if let ["finished", "in", secs] = words.as_slice() {
                if let Ok(secs) = secs.trim_end_matches('s').parse::<f64>() {
                    *acc.duration_seconds.get_or_insert(0.0) += secs;
                }
                continue;
            }
            let [.., count, label] = words.as_slice() else {
                continue;
            };
            let Ok(count) = count.parse::<u32>() else {
                continue;
            };
            match *label {
                "passed" => acc.passed = acc.passed.saturating_add(count),
                "failed" => acc.failed = acc.failed.saturating_add(count),
                "ignored" => acc.skipped = acc.skipped.saturating_add(count),
                _ => {}
            }
        }
        acc.total = acc.passed.saturating_add(acc.failed).saturating_add(acc.skipped);
    }
    summary
}

/// Captured output of failing tests, keyed by test name.
///
/// A block starts at `---- name stdout ----` and runs until the next block,
/// the `failures:` name list or a summary line.
fn parse_failure_blocks(output: &str) -> HashMap<&str, String> {
    fn finish<'a>(block: Option<(&'a str, Vec<&'a str>)>, blocks: &mut HashMap<&'a str, String>) {
        if let Some((name, lines)) = block {
            let text = lines.join("\n").trim().to_string();
            if !text.is_empty() {
                blocks.insert(name, text);
            }
        }
    }

    let mut blocks = HashMap::new();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed
            .strip_prefix("---- ")
            .and_then(|rest| rest.strip_suffix(" stdout ----"))
        {
            finish(current.take(), &mut blocks);
            current = Some((name.trim(), Vec::new()));
        } else if trimmed == "failures:" || trimmed.starts_with("test result:") {
            finish(current.take(), &mut blocks);
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    finish(current, &mut blocks);
    blocks
}

fn parse_case_line(line: &str) -> Option<TestCaseResult> {
    let rest = line.trim().strip_prefix("test ")?;
    let (name, outcome) = rest.rsplit_once(" ... ")?;
    let state = if outcome.starts_with("ok") {
        TestState::Passed
    } else if outcome.starts_with("FAILED") {
        TestState::Failed
    } else if outcome.starts_with("ignored") {
        TestState::Skipped
    } else {
        return None;
    };
    Some(TestCaseResult::new(name.trim(), state))
}

/// Last `n` non-empty lines of `text`, joined for a one-line error.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    if lines.is_empty() {
        return "no output".to_string();
    }
    lines[start..].join("; ")
}
