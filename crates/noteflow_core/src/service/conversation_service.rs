//! AI conversation log use-case service.

use crate::model::conversation::{AiMessage, NewAiMessage};
use crate::repo::conversation_repo::ConversationRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for conversation use-cases.
#[derive(Debug)]
pub enum ConversationServiceError {
    /// Message content is blank after trim.
    EmptyContent,
    Repo(RepoError),
}

impl Display for ConversationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "message content must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConversationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::EmptyContent => None,
        }
    }
}

impl From<RepoError> for ConversationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Conversation log facade.
pub struct ConversationService<R: ConversationRepository> {
    repo: R,
}

impl<R: ConversationRepository> ConversationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Appends one message to the log.
    pub fn add_message(&self, message: NewAiMessage) -> Result<AiMessage, ConversationServiceError> {
        if message.content.trim().is_empty() {
            return Err(ConversationServiceError::EmptyContent);
        }
        let stored = self.repo.append_message(&message)?;
        info!(
            "event=conversation_append module=conversation_service status=ok role={} kind={}",
            stored.role.as_str(),
            stored.kind.as_str()
        );
        Ok(stored)
    }

    /// Lists the whole log oldest-first.
    pub fn list_messages(&self) -> Result<Vec<AiMessage>, ConversationServiceError> {
        self.repo.list_messages().map_err(Into::into)
    }

    /// Clears the log. Returns removed message count.
    pub fn clear(&self) -> Result<usize, ConversationServiceError> {
        let removed = self.repo.clear_messages()?;
        info!(
            "event=conversation_clear module=conversation_service status=ok removed_count={}",
            removed
        );
        Ok(removed)
    }
}
