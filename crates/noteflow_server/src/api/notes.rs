//! Note tree endpoints.
//!
//! Content edits made here feed the shared edit history so undo/redo works
//! across requests.

use crate::api::{parse_note_id, MAX_TEXT_BODY_BYTES};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use noteflow_core::{
    search_notes, EditHistoryEntry, NewNote, Note, NoteId, NotePatch, NoteService,
    NoteTreeNode, SearchHit, SearchQuery, SearchScope, SqliteNoteRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

type Service<'conn> = NoteService<SqliteNoteRepository<'conn>>;

fn note_service(conn: &Connection) -> ApiResult<Service<'_>> {
    Ok(NoteService::new(SqliteNoteRepository::try_new(conn)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Target folder; absent or null moves to the root.
    #[serde(default)]
    pub parent_id: Option<NoteId>,
    /// Index among the new siblings; absent appends.
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AppendRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub removed_ids: Vec<NoteId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub entries: Vec<EditHistoryEntry>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// GET /api/notes
pub async fn list_notes(State(state): State<AppState>) -> ApiResult<Json<Vec<Note>>> {
    let conn = state.lock_db()?;
    Ok(Json(note_service(&conn)?.list_notes()?))
}

/// GET /api/notes/tree
pub async fn note_tree(State(state): State<AppState>) -> ApiResult<Json<Vec<NoteTreeNode>>> {
    let conn = state.lock_db()?;
    Ok(Json(note_service(&conn)?.tree()?))
}

/// GET /api/notes/search?q=&scope=&limit=
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let Query(params) = params?;
    let mut query = SearchQuery::new(params.q.unwrap_or_default());
    if let Some(scope) = params.scope.as_deref() {
        query = query.with_scope(SearchScope::parse(scope)?);
    }
    if let Some(limit) = params.limit {
        query.limit = limit;
    }

    let conn = state.lock_db()?;
    Ok(Json(search_notes(&conn, &query)?))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<NewNote>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let Json(input) = payload?;
    let conn = state.lock_db()?;
    let note = note_service(&conn)?.add_note(input)?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    Ok(Json(note_service(&conn)?.get_note(id)?))
}

/// PATCH /api/notes/:id
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NotePatch>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let Json(patch) = payload?;
    let conn = state.lock_db()?;
    let service = note_service(&conn)?;
    let mut history = state.lock_history()?;
    Ok(Json(service.update_note(id, patch, Some(&mut *history))?))
}

/// DELETE /api/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    let service = note_service(&conn)?;
    let mut history = state.lock_history()?;
    let removed_ids = service.delete_note(id, Some(&mut *history))?;
    Ok(Json(DeleteResponse { removed_ids }))
}

/// POST /api/notes/:id/move
pub async fn move_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let Json(request) = payload?;
    let conn = state.lock_db()?;
    let note = note_service(&conn)?.move_note(id, request.parent_id, request.order)?;
    Ok(Json(note))
}

/// POST /api/notes/:id/toggle-expand
pub async fn toggle_expand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    Ok(Json(note_service(&conn)?.toggle_folder_expand(id)?))
}

/// POST /api/notes/:id/append
///
/// Inserts AI output at the end of the note.
pub async fn append_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AppendRequest>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let Json(request) = payload?;
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    let conn = state.lock_db()?;
    let service = note_service(&conn)?;
    let mut history = state.lock_history()?;
    Ok(Json(service.append_content(
        id,
        &request.content,
        Some(&mut *history),
    )?))
}

/// GET /api/notes/:id/history
pub async fn note_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    note_service(&conn)?.get_note(id)?;
    let history = state.lock_history()?;
    Ok(Json(HistoryResponse {
        entries: history.entries(id),
        can_undo: history.can_undo(id),
        can_redo: history.can_redo(id),
    }))
}

/// POST /api/notes/:id/undo
pub async fn undo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    let service = note_service(&conn)?;
    let mut history = state.lock_history()?;
    service
        .undo(id, &mut history)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Nothing to undo".to_string()))
}

/// POST /api/notes/:id/redo
pub async fn redo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = parse_note_id(&id)?;
    let conn = state.lock_db()?;
    let service = note_service(&conn)?;
    let mut history = state.lock_history()?;
    service
        .redo(id, &mut history)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Nothing to redo".to_string()))
}

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/tree", get(note_tree))
        .route("/api/notes/search", get(search))
        .route(
            "/api/notes/:id",
            get(get_note).patch(update_note).delete(delete_note),
        )
        .route("/api/notes/:id/move", post(move_note))
        .route("/api/notes/:id/toggle-expand", post(toggle_expand))
        .route("/api/notes/:id/append", post(append_content))
        .route("/api/notes/:id/history", get(note_history))
        .route("/api/notes/:id/undo", post(undo))
        .route("/api/notes/:id/redo", post(redo))
        .layer(DefaultBodyLimit::max(MAX_TEXT_BODY_BYTES))
}
