//! TOML configuration for testbridge.
//!
//! Layered model: an explicit `--config` path, then the `TESTBRIDGE_CONFIG`
//! environment variable, then `./testbridge.toml`, then compiled-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::mode::RunMode;
use crate::orchestrator::DEFAULT_TIMEOUT_SECS;

pub const CONFIG_ENV_VAR: &str = "TESTBRIDGE_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "testbridge.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the bridge process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded testbridge configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from, in order:
    /// 1. `explicit`, if given. Errors here are returned, not skipped.
    /// 2. The path in the `TESTBRIDGE_CONFIG` environment variable.
    /// 3. `./testbridge.toml`.
    /// 4. Compiled-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "TESTBRIDGE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.runner.default_timeout_seconds == 0 {
            anyhow::bail!("runner.default_timeout_seconds must be greater than zero");
        }
        for mode in RunMode::ALL {
            if let Some(cmd) = self.runner.command_for(mode) {
                if cmd.program.trim().is_empty() {
                    anyhow::bail!("runner.{}.program must not be empty", mode.as_str());
                }
            }
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8470".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Test execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Timeout used when a request carries none (or a non-positive one).
    pub default_timeout_seconds: u64,
    /// Command for edit-mode runs. Defaults to `cargo test --lib`.
    pub edit: Option<CommandConfig>,
    /// Command for play-mode runs.
    pub play: Option<CommandConfig>,
}

impl RunnerConfig {
    pub fn command_for(&self, mode: RunMode) -> Option<&CommandConfig> {
        match mode {
            RunMode::Edit => self.edit.as_ref(),
            RunMode::Play => self.play.as_ref(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: DEFAULT_TIMEOUT_SECS,
            // The name goes after `--` so cargo never parses it.
            edit: Some(CommandConfig::cargo(&["test", "--lib", "--", "--exact", TEST_PLACEHOLDER])),
            play: Some(CommandConfig::cargo(&["test", "--tests", "--", "--exact", TEST_PLACEHOLDER])),
        }
    }
}

/// Placeholder substituted with the requested test name in command args.
pub const TEST_PLACEHOLDER: &str = "{test}";

/// External test command for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl CommandConfig {
    fn cargo(args: &[&str]) -> Self {
        Self {
            program: "cargo".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: None,
        }
    }

    /// Arguments with every `{test}` placeholder replaced by `test_name`.
    ///
    /// Each argument is passed to the program as-is, never through a shell.
    /// A placeholder inside a `sh -c` script is interpolated verbatim, so pass
    /// the name as a positional argument (`$1`) instead.
    pub fn render_args(&self, test_name: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(TEST_PLACEHOLDER, test_name))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
