//! NoteFlow HTTP server: note store endpoints plus the AI pass-through routes.

pub mod ai;
pub mod api;
pub mod config;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use crate::ai::AiBackend;
use axum::Router;
use noteflow_core::EditHistory;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Shared handler state.
///
/// The SQLite connection and edit history sit behind blocking mutexes;
/// handlers take a guard for one short synchronous operation and release it
/// before awaiting anything. Lock order is `db` then `history`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub history: Arc<Mutex<EditHistory>>,
    pub ai: Arc<dyn AiBackend>,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(conn: Connection, ai: Arc<dyn AiBackend>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            history: Arc::new(Mutex::new(EditHistory::new())),
            ai,
            startup_time: Instant::now(),
        }
    }

    pub fn lock_db(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    pub fn lock_history(&self) -> ApiResult<MutexGuard<'_, EditHistory>> {
        self.history
            .lock()
            .map_err(|_| ApiError::Internal("edit history lock poisoned".to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::note_routes())
        .merge(api::state_routes())
        .merge(api::settings_routes())
        .merge(api::conversation_routes())
        .merge(api::ai_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
