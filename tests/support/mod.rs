//! Fake execution service shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use testbridge::mode::RunMode;
use testbridge::orchestrator::TestRunOrchestrator;
use testbridge::result::TestRunResult;
use testbridge::service::{RunFuture, TestExecutionService};

/// What the fake does when asked to start a run.
#[derive(Clone)]
pub enum Behavior {
    /// Resolve immediately with the given result.
    Resolve(TestRunResult),
    /// Resolve with the given result after a delay.
    Delay(Duration, TestRunResult),
    /// Refuse to start.
    FailOnStart(String),
    /// Start, then fail.
    FailDuringRun(String),
    /// Start and never finish.
    Never,
    /// Start, then panic inside the run.
    Panic,
}

pub struct FakeService {
    behavior: Behavior,
    starts: AtomicUsize,
    completions: Arc<AtomicUsize>,
    calls: Mutex<Vec<(RunMode, String)>>,
}

impl FakeService {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            starts: AtomicUsize::new(0),
            completions: Arc::new(AtomicUsize::new(0)),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Number of times `start` was invoked.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of delayed runs that ran to the end.
    pub fn completion_count(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(RunMode, String)> {
        self.calls.lock().unwrap().clone()
    }
}

async fn crash() -> anyhow::Result<TestRunResult> {
    panic!("runner crashed")
}

#[async_trait::async_trait]
impl TestExecutionService for FakeService {
    async fn start(&self, mode: RunMode, test_name: &str) -> anyhow::Result<RunFuture> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((mode, test_name.to_string()));

        match &self.behavior {
            Behavior::Resolve(result) => {
                let result = result.clone();
                Ok(async move { Ok(result) }.boxed())
            }
            Behavior::Delay(delay, result) => {
                let (delay, result) = (*delay, result.clone());
                let completions = self.completions.clone();
                Ok(async move {
                    tokio::time::sleep(delay).await;
                    completions.fetch_add(1, Ordering::SeqCst);
                    Ok(result)
                }
                .boxed())
            }
            Behavior::FailOnStart(cause) => Err(anyhow::anyhow!(cause.clone())),
            Behavior::FailDuringRun(cause) => {
                let cause = cause.clone();
                Ok(async move { Err(anyhow::anyhow!(cause)) }.boxed())
            }
            Behavior::Never => Ok(futures::future::pending::<anyhow::Result<TestRunResult>>().boxed()),
            Behavior::Panic => Ok(crash().boxed()),
        }
    }
}

pub fn orchestrator(service: &Arc<FakeService>) -> TestRunOrchestrator {
    TestRunOrchestrator::new(service.clone())
}

pub fn three_of_four() -> TestRunResult {
    TestRunResult::from_counts(3, 1, 0, 4)
}
