//! API route definitions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::state::AppState;
use crate::command::{self, CommandResponse};
use crate::error::RunError;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            &format!("/commands/{}", command::COMMAND_NAME),
            post(run_single_test),
        )
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339()
        }
    }))
}

async fn run_single_test(
    State(state): State<AppState>,
    Json(params): Json<Value>,
) -> (StatusCode, Json<CommandResponse>) {
    let outcome = command::handle(&state.orchestrator, &params).await;
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    (status, Json(outcome.into()))
}

fn status_for(err: &RunError) -> StatusCode {
    match err {
        RunError::InvalidArgument(_) | RunError::InvalidMode(_) => StatusCode::BAD_REQUEST,
        RunError::StartFailure(_) => StatusCode::CONFLICT,
        RunError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RunError::ExecutionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
