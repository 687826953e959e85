//! AI service boundary.
//!
//! Handlers talk to [`AiBackend`]; [`client::HttpAiClient`] is the production
//! implementation. Each call is one request/response round trip: no retry,
//! streaming or caching.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::HttpAiClient;

const PDF_MIME_TYPE: &str = "application/pdf";

/// AI call failure. The display text is what API clients see.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One chat completion message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Uploaded file forwarded to the AI service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE || self.file_name.ends_with(".pdf")
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>`; PDFs always use `application/pdf`.
    pub fn data_url(&self) -> String {
        let mime_type = if self.is_pdf() {
            PDF_MIME_TYPE
        } else {
            self.mime_type.as_str()
        };
        format!("data:{mime_type};base64,{}", self.to_base64())
    }
}

/// Hosted AI operations used by the HTTP layer.
///
/// `api_key` is the caller-resolved key; `None` lets the implementation fall
/// back to its own configured key.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Returns the first completion's text, or an empty string when the
    /// service returned no content.
    async fn chat(&self, messages: &[ChatMessage], api_key: Option<&str>)
        -> Result<String, AiError>;

    /// Runs a vision completion over an image or PDF.
    async fn vision(
        &self,
        prompt: &str,
        attachment: &Attachment,
        api_key: Option<&str>,
    ) -> Result<String, AiError>;

    /// Transcribes an audio file.
    async fn transcribe(&self, audio: &Attachment, api_key: Option<&str>)
        -> Result<String, AiError>;
}

#[cfg(test)]
mod tests {
    use super::{Attachment, ChatMessage, ChatRole};

    fn attachment(file_name: &str, mime_type: &str) -> Attachment {
        Attachment {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: b"hi".to_vec(),
        }
    }

    #[test]
    fn pdf_detection_uses_mime_or_extension() {
        assert!(attachment("scan.pdf", "application/octet-stream").is_pdf());
        assert!(attachment("scan", "application/pdf").is_pdf());
        assert!(!attachment("photo.png", "image/png").is_pdf());
    }

    #[test]
    fn data_url_embeds_base64_payload() {
        assert_eq!(
            attachment("photo.png", "image/png").data_url(),
            "data:image/png;base64,aGk="
        );
        assert_eq!(
            attachment("doc.pdf", "").data_url(),
            "data:application/pdf;base64,aGk="
        );
    }

    #[test]
    fn chat_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::new(ChatRole::Assistant, "x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }
}
