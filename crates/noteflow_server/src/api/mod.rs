//! HTTP handlers, one module per resource.

pub mod ai;
pub mod conversations;
pub mod health;
pub mod notes;
pub mod settings;
pub mod state;

pub use ai::ai_routes;
pub use conversations::conversation_routes;
pub use health::health_routes;
pub use notes::note_routes;
pub use settings::settings_routes;
pub use state::state_routes;

use crate::{ApiError, ApiResult};
use noteflow_core::NoteId;

/// Body cap for JSON routes that carry note text: a whole upload's worth of
/// transcript or OCR output, twice over for JSON escaping.
pub const MAX_TEXT_BODY_BYTES: usize = 2 * ai::MAX_UPLOAD_BYTES;

/// Parses a path id; malformed ids are a client error.
pub(crate) fn parse_note_id(raw: &str) -> ApiResult<NoteId> {
    NoteId::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("invalid note id: {raw}")))
}
