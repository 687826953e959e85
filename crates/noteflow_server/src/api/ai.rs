//! AI pass-through endpoints.
//!
//! Each route validates its input, builds a fixed prompt, makes one call on
//! the [`AiBackend`](crate::ai::AiBackend) and relays the answer.
//!
//! API key precedence: request `apiKey`, then stored settings, then the
//! backend's configured key.

use crate::ai::prompts::{self, EditAction};
use crate::ai::{Attachment, ChatMessage};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};
use log::info;
use noteflow_core::{SettingsService, SqliteSettingsRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
/// Headroom for multipart boundaries and text fields on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/mp3",
];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "mp4"];

const ACTION_MEETING_MINUTES: &str = "meeting-minutes";
const DEFAULT_TRANSCRIBE_ACTION: &str = "transcribe";
const DEFAULT_VISION_ACTION: &str = "ocr";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Note the user was viewing. Accepted for client compatibility; only
    /// logged.
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub edited_text: String,
}

/// Shared by transcribe and vision: `text` is the raw result, `content` the
/// text to insert into a note.
#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub text: String,
    pub content: String,
}

/// POST /api/ai/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;
    let message = required(request.message.as_deref(), "Message is required")?;
    let api_key = resolve_api_key(&state, request.api_key.as_deref())?;

    let history = request.conversation_history.unwrap_or_default();
    let messages = prompts::chat_messages(&history, message);
    let response = state.ai.chat(&messages, api_key.as_deref()).await?;

    info!(
        "event=ai_route module=api status=ok op=chat history_len={} has_note={}",
        history.len(),
        request.note_id.is_some()
    );
    Ok(Json(ChatResponse { response }))
}

/// POST /api/ai/edit
///
/// An empty completion falls back to the input text.
pub async fn edit(
    State(state): State<AppState>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> ApiResult<Json<EditResponse>> {
    let Json(request) = payload?;
    let text = required(request.text.as_deref(), "Text is required")?;
    let action_label = required(request.action.as_deref(), "Action is required")?;
    let api_key = resolve_api_key(&state, request.api_key.as_deref())?;

    let action = EditAction::parse(action_label);
    let prompt = prompts::edit_prompt(
        action,
        text,
        request.language.as_deref(),
        request.custom_prompt.as_deref(),
    );
    let completion = state
        .ai
        .chat(&prompts::edit_messages(prompt), api_key.as_deref())
        .await?;

    info!(
        "event=ai_route module=api status=ok op=edit action={:?} empty_completion={}",
        action,
        completion.is_empty()
    );
    let edited_text = if completion.is_empty() {
        text.to_string()
    } else {
        completion
    };
    Ok(Json(EditResponse { edited_text }))
}

/// POST /api/ai/transcribe
///
/// Multipart fields: `file` (audio), `action` (`transcribe` or
/// `meeting-minutes`), optional `apiKey`.
pub async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractionResponse>> {
    let UploadForm { file, fields } = read_upload(multipart?).await?;
    let action = field_or(&fields, "action", DEFAULT_TRANSCRIBE_ACTION);
    let audio = file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if !is_supported_audio(&audio) {
        return Err(ApiError::BadRequest(
            "Invalid audio format. Supported formats: mp3, wav, m4a".to_string(),
        ));
    }
    let api_key = resolve_api_key(&state, fields.get("apiKey").map(String::as_str))?;

    let text = state.ai.transcribe(&audio, api_key.as_deref()).await?;
    let content = if action == ACTION_MEETING_MINUTES && !text.is_empty() {
        let minutes = state
            .ai
            .chat(&prompts::meeting_minutes_messages(&text), api_key.as_deref())
            .await?;
        if minutes.is_empty() {
            text.clone()
        } else {
            minutes
        }
    } else {
        text.clone()
    };

    info!(
        "event=ai_route module=api status=ok op=transcribe action={} bytes={}",
        action,
        audio.bytes.len()
    );
    Ok(Json(ExtractionResponse { text, content }))
}

/// POST /api/ai/vision
///
/// Multipart fields: `file` (image or PDF), `action` (`ocr` default),
/// optional `prompt` overriding the action template, optional `apiKey`.
pub async fn vision(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractionResponse>> {
    let UploadForm { file, fields } = read_upload(multipart?).await?;
    let action = field_or(&fields, "action", DEFAULT_VISION_ACTION);
    let attachment = file.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let api_key = resolve_api_key(&state, fields.get("apiKey").map(String::as_str))?;

    let prompt = prompts::vision_prompt(action, fields.get("prompt").map(String::as_str));
    let result = state
        .ai
        .vision(&prompt, &attachment, api_key.as_deref())
        .await?;

    info!(
        "event=ai_route module=api status=ok op=vision action={} is_pdf={} bytes={}",
        action,
        attachment.is_pdf(),
        attachment.bytes.len()
    );
    Ok(Json(ExtractionResponse {
        text: result.clone(),
        content: result,
    }))
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/edit", post(edit))
        .route("/api/ai/transcribe", post(transcribe))
        .route("/api/ai/vision", post(vision))
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
}

struct UploadForm {
    file: Option<Attachment>,
    fields: HashMap<String, String>,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" {
            fields.insert(name, field.text().await?);
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::PayloadTooLarge(
                    "File exceeds 25MB limit".to_string(),
                ));
            }
        }
        file = Some(Attachment {
            file_name,
            mime_type,
            bytes,
        });
    }

    Ok(UploadForm { file, fields })
}

fn is_supported_audio(audio: &Attachment) -> bool {
    if AUDIO_MIME_TYPES.contains(&audio.mime_type.as_str()) {
        return true;
    }
    Path::new(&audio.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

/// Request key, then stored settings key. `None` defers to the backend.
fn resolve_api_key(state: &AppState, requested: Option<&str>) -> ApiResult<Option<String>> {
    if let Some(key) = requested.map(str::trim).filter(|key| !key.is_empty()) {
        return Ok(Some(key.to_string()));
    }
    let conn = state.lock_db()?;
    let settings = SettingsService::new(SqliteSettingsRepository::try_new(&conn)?).get()?;
    Ok(Some(settings.api_key).filter(|key| !key.is_empty()))
}

fn required<'a>(value: Option<&'a str>, message: &str) -> ApiResult<&'a str> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

fn field_or<'a>(fields: &'a HashMap<String, String>, name: &str, default: &'a str) -> &'a str {
    fields
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{field_or, is_supported_audio, required};
    use crate::ai::Attachment;
    use std::collections::HashMap;

    fn audio(file_name: &str, mime_type: &str) -> Attachment {
        Attachment {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: Vec::new(),
        }
    }

    #[test]
    fn audio_accepted_by_mime_or_extension() {
        assert!(is_supported_audio(&audio("clip", "audio/mpeg")));
        assert!(is_supported_audio(&audio("clip.M4A", "application/octet-stream")));
        assert!(!is_supported_audio(&audio("clip.ogg", "audio/ogg")));
        assert!(!is_supported_audio(&audio("notes.txt", "text/plain")));
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        assert!(required(None, "x").is_err());
        assert!(required(Some(""), "x").is_err());
        assert_eq!(required(Some(" hi "), "x").unwrap(), " hi ");
    }

    #[test]
    fn blank_fields_use_default() {
        let mut fields = HashMap::new();
        fields.insert("action".to_string(), "  ".to_string());
        assert_eq!(field_or(&fields, "action", "ocr"), "ocr");
        fields.insert("action".to_string(), "chart".to_string());
        assert_eq!(field_or(&fields, "action", "ocr"), "chart");
    }
}
