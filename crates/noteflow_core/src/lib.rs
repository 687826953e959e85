//! Core domain logic for NoteFlow.
//! Owns the note tree, the AI conversation log and app settings; the HTTP
//! server only translates requests into calls on this crate.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, logging_status, sanitize_log_value, LoggingError,
};
pub use model::conversation::{
    AiMessage, MessageId, MessageKind, MessageMetadata, MessageRole, NewAiMessage,
};
pub use model::history::{EditHistory, EditHistoryEntry, HISTORY_CAPACITY};
pub use model::note::{NewNote, Note, NoteId, NotePatch, NoteTreeNode};
pub use model::settings::{AppSettings, SettingsPatch, SettingsValidationError, Theme};
pub use repo::conversation_repo::{ConversationRepository, SqliteConversationRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::{RepoError, RepoResult};
pub use search::{
    markdown_snippet, search_notes, SearchError, SearchHit, SearchQuery, SearchResult,
    SearchScope,
};
pub use service::conversation_service::{ConversationService, ConversationServiceError};
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};
pub use service::settings_service::{SettingsError, SettingsService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
