//! AI conversation log repository.
//!
//! # Invariants
//! - Messages are returned in insertion order (`seq ASC`).
//! - Metadata columns are all-null when the message carries no metadata.

use super::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use crate::model::conversation::{
    AiMessage, MessageKind, MessageMetadata, MessageRole, NewAiMessage,
};
use crate::model::now_epoch_ms;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for the conversation log.
pub trait ConversationRepository {
    /// Appends one message and returns the stored record.
    fn append_message(&self, message: &NewAiMessage) -> RepoResult<AiMessage>;
    /// Lists all messages oldest-first.
    fn list_messages(&self) -> RepoResult<Vec<AiMessage>>;
    /// Removes every message. Returns number of removed rows.
    fn clear_messages(&self) -> RepoResult<usize>;
}

/// SQLite-backed conversation log.
pub struct SqliteConversationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConversationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "ai_messages",
            &[
                "seq",
                "id",
                "role",
                "content",
                "kind",
                "file_name",
                "file_type",
                "action",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ConversationRepository for SqliteConversationRepository<'_> {
    fn append_message(&self, message: &NewAiMessage) -> RepoResult<AiMessage> {
        let stored = AiMessage {
            id: Uuid::new_v4(),
            role: message.role,
            content: message.content.clone(),
            timestamp: now_epoch_ms(),
            kind: message.kind,
            metadata: message
                .metadata
                .clone()
                .filter(|metadata| !metadata.is_empty()),
        };
        let metadata = stored.metadata.clone().unwrap_or_default();

        self.conn.execute(
            "INSERT INTO ai_messages (
                id,
                role,
                content,
                kind,
                file_name,
                file_type,
                action,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                stored.id.to_string(),
                stored.role.as_str(),
                stored.content.as_str(),
                stored.kind.as_str(),
                metadata.file_name,
                metadata.file_type,
                metadata.action,
                stored.timestamp,
            ],
        )?;
        Ok(stored)
    }

    fn list_messages(&self) -> RepoResult<Vec<AiMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                role,
                content,
                kind,
                file_name,
                file_type,
                action,
                created_at
             FROM ai_messages
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn clear_messages(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM ai_messages;", [])?;
        Ok(removed)
    }
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<AiMessage> {
    let id_text: String = row.get("id")?;
    let role_text: String = row.get("role")?;
    let kind_text: String = row.get("kind")?;

    let role = MessageRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in ai_messages.role"))
    })?;
    let kind = MessageKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in ai_messages.kind"))
    })?;

    let metadata = MessageMetadata {
        file_name: row.get("file_name")?,
        file_type: row.get("file_type")?,
        action: row.get("action")?,
    };

    Ok(AiMessage {
        id: parse_uuid(&id_text, "ai_messages.id")?,
        role,
        content: row.get("content")?,
        timestamp: row.get("created_at")?,
        kind,
        metadata: Some(metadata).filter(|metadata| !metadata.is_empty()),
    })
}
