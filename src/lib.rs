//! testbridge -- run a single named editor test under a timeout.
//!
//! This crate provides the core library for the bridge: a timeout-racing
//! orchestrator over a pluggable test execution service, the
//! `run_single_test` command handler, and an HTTP API that serves it.

pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod exec;
pub mod mode;
pub mod orchestrator;
pub mod result;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::BridgeConfig;
use crate::exec::CommandService;
use crate::orchestrator::TestRunOrchestrator;

/// Build an orchestrator backed by the configured test commands.
pub fn build_orchestrator(config: &BridgeConfig) -> TestRunOrchestrator {
    let service = CommandService::new(config.runner.clone());
    TestRunOrchestrator::new(Arc::new(service))
        .with_default_timeout(config.runner.default_timeout_seconds)
}

/// Start the testbridge HTTP API and serve until Ctrl-C.
pub async fn serve(config: &BridgeConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;

    let state = api::state::AppState {
        orchestrator: build_orchestrator(config),
    };
    let app = api::router(state);

    tracing::info!(%addr, "testbridge listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("testbridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
