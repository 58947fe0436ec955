use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use testbridge::command::{self, CommandResponse};
use testbridge::config::{BridgeConfig, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "testbridge",
    about = "Editor test bridge: run a single named test with a timeout",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the run_single_test command over HTTP
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a single test and print the summary
    Run {
        /// Name of the test to run
        #[arg(long)]
        test: String,

        /// Test mode: edit or play
        #[arg(long, default_value = "play")]
        mode: String,

        /// Timeout in seconds (non-positive means the configured default)
        #[arg(long, allow_hyphen_values = true)]
        timeout: Option<i64>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    CheckConfig,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = BridgeConfig::resolve(cli.config.as_deref())?;

    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting testbridge");
            testbridge::serve(&config).await?;
        }
        Commands::Run {
            test,
            mode,
            timeout,
            json,
        } => {
            let orchestrator = testbridge::build_orchestrator(&config);
            let params = json!({
                "testName": test,
                "mode": mode,
                "timeoutSeconds": timeout,
            });
            let response = command::dispatch(&orchestrator, &params).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                // Returned rather than exited, so the runtime still drops a
                // timed-out run and kills its child.
                if !response.is_success() {
                    return Ok(ExitCode::FAILURE);
                }
            } else {
                match response {
                    CommandResponse::Success(ok) => {
                        println!("{}", ok.message);
                        for case in &ok.results {
                            println!("  {:<8} {}", format!("{:?}", case.state), case.name);
                        }
                    }
                    CommandResponse::Failure { error } => anyhow::bail!(error),
                }
            }
        }
        Commands::CheckConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
