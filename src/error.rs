//! Error taxonomy for a single test run.
//!
//! Every variant renders the exact message returned to RPC callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// Missing or blank input, detected before any work starts.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("unknown test mode '{0}'; expected one of: edit, play")]
    InvalidMode(String),

    /// The execution service could not begin the run.
    #[error("Failed to start test run: {0}")]
    StartFailure(String),

    /// The watchdog fired before the run completed.
    #[error("Test run timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The run began but failed internally.
    #[error("{0}")]
    ExecutionFailure(String),
}

impl RunError {
    /// Short machine-readable kind, used for logging and HTTP mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::InvalidArgument(_) => "invalid_argument",
            RunError::InvalidMode(_) => "invalid_mode",
            RunError::StartFailure(_) => "start_failure",
            RunError::Timeout { .. } => "timeout",
            RunError::ExecutionFailure(_) => "execution_failure",
        }
    }
}
