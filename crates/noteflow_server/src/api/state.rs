//! UI selection state.

use crate::{ApiResult, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use noteflow_core::{NoteId, NoteService, SqliteNoteRepository};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveNote {
    /// `null` clears the selection.
    #[serde(default)]
    pub note_id: Option<NoteId>,
}

/// GET /api/state/active-note
pub async fn get_active_note(State(state): State<AppState>) -> ApiResult<Json<ActiveNote>> {
    let conn = state.lock_db()?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn)?);
    Ok(Json(ActiveNote {
        note_id: service.active_note()?,
    }))
}

/// PUT /api/state/active-note
pub async fn set_active_note(
    State(state): State<AppState>,
    payload: Result<Json<ActiveNote>, JsonRejection>,
) -> ApiResult<Json<ActiveNote>> {
    let Json(request) = payload?;
    let conn = state.lock_db()?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn)?);
    service.set_active_note(request.note_id)?;
    Ok(Json(request))
}

pub fn state_routes() -> Router<AppState> {
    Router::new().route(
        "/api/state/active-note",
        get(get_active_note).put(set_active_note),
    )
}
