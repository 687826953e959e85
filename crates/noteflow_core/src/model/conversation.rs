//! AI conversation log model.
//!
//! # Invariants
//! - The log is append-only; messages are ordered by insertion.
//! - `content` is never blank for persisted messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one conversation message.
pub type MessageId = Uuid;

/// Speaker of one conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// Input modality that produced a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Audio,
    Image,
    Pdf,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Optional file/action details attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none() && self.file_type.is_none() && self.action.is_none()
    }
}

/// One persisted conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Input for appending one message; id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAiMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

impl NewAiMessage {
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            kind: MessageKind::Text,
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageKind, MessageRole, NewAiMessage};

    #[test]
    fn role_and_kind_round_trip_through_labels() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::parse(role.as_str()), Some(role));
        }
        for kind in [
            MessageKind::Text,
            MessageKind::Audio,
            MessageKind::Image,
            MessageKind::Pdf,
        ] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageRole::parse("system"), None);
    }

    #[test]
    fn new_message_defaults_kind_to_text() {
        let parsed: NewAiMessage =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).expect("valid json");
        assert_eq!(parsed.kind, MessageKind::Text);
        assert!(parsed.metadata.is_none());
    }
}
