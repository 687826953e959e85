//! AI conversation log endpoints.

use crate::api::MAX_TEXT_BODY_BYTES;
use crate::{ApiResult, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use noteflow_core::{AiMessage, ConversationService, NewAiMessage, SqliteConversationRepository};
use rusqlite::Connection;
use serde::Serialize;

type Service<'conn> = ConversationService<SqliteConversationRepository<'conn>>;

fn conversation_service(conn: &Connection) -> ApiResult<Service<'_>> {
    Ok(ConversationService::new(
        SqliteConversationRepository::try_new(conn)?,
    ))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// GET /api/conversations
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Json<Vec<AiMessage>>> {
    let conn = state.lock_db()?;
    Ok(Json(conversation_service(&conn)?.list_messages()?))
}

/// POST /api/conversations
pub async fn add_message(
    State(state): State<AppState>,
    payload: Result<Json<NewAiMessage>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AiMessage>)> {
    let Json(message) = payload?;
    let conn = state.lock_db()?;
    let stored = conversation_service(&conn)?.add_message(message)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE /api/conversations
pub async fn clear_messages(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let conn = state.lock_db()?;
    let removed = conversation_service(&conn)?.clear()?;
    Ok(Json(ClearResponse { removed }))
}

pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/conversations",
            get(list_messages).post(add_message).delete(clear_messages),
        )
        .layer(DefaultBodyLimit::max(MAX_TEXT_BODY_BYTES))
}
