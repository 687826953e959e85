//! Application settings endpoints.

use crate::{ApiResult, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use noteflow_core::{AppSettings, SettingsPatch, SettingsService, SqliteSettingsRepository};

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<AppSettings>> {
    let conn = state.lock_db()?;
    let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn)?);
    Ok(Json(service.get()?))
}

/// PATCH /api/settings
///
/// Merges the given fields; out-of-range values are rejected with 400 and
/// nothing is written.
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> ApiResult<Json<AppSettings>> {
    let Json(patch) = payload?;
    let conn = state.lock_db()?;
    let service = SettingsService::new(SqliteSettingsRepository::try_new(&conn)?);
    Ok(Json(service.update(&patch)?))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).patch(update_settings))
}
