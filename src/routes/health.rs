use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptimeSecs": state.uptime_secs(),
        "activeSessions": state.sessions().len().await,
        "modelLoaded": state.engine().model().is_loaded(),
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Ready once the scoring model is available; the first probe may trigger
/// the load.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.engine().model().get() {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed: scoring model unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let healthy = state.store().get_user_by_id("__health_check__").is_ok();
    let latency_us = start.elapsed().as_micros() as u64;
    let question_count = state.store().count_questions();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "healthy": healthy,
            "latencyUs": latency_us,
            "questionCount": question_count,
        })),
    )
}
