//! Health check endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Module name ("nms-mos")
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub client_id: i64,
    pub uptime_seconds: u64,
    /// Connected notification subscribers
    pub subscribers: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "nms-mos".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        client_id: state.client_id,
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        subscribers: state.bus.subscriber_count(),
    })
}
