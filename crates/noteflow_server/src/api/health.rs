//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use noteflow_core::db::migrations::current_user_version;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be queried
    pub status: String,
    pub module: String,
    pub version: String,
    pub core_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let schema_version = state
        .lock_db()
        .ok()
        .and_then(|conn| current_user_version(&conn).ok());

    Json(HealthResponse {
        status: if schema_version.is_some() { "ok" } else { "degraded" }.to_string(),
        module: "noteflow".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        core_version: noteflow_core::core_version().to_string(),
        schema_version,
        uptime_seconds: state.startup_time.elapsed().as_secs(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
