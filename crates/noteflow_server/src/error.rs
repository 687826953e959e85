//! HTTP error mapping.
//!
//! Every failure leaves the server as `{ "error": "<message>" }` with a status
//! derived from the core error kind.

use crate::ai::AiError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use noteflow_core::{
    ConversationServiceError, NoteServiceError, RepoError, SearchError, SettingsError,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 409
    #[error("{0}")]
    Conflict(String),

    /// 413
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 500, upstream AI failure
    #[error(transparent)]
    Ai(#[from] AiError),

    /// 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Ai(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(
                "event=request_failed module=api status=error http_status={} error={}",
                status.as_u16(),
                noteflow_core::sanitize_log_value(&message, 300)
            );
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<NoteServiceError> for ApiError {
    fn from(value: NoteServiceError) -> Self {
        match value {
            NoteServiceError::InvalidTitle
            | NoteServiceError::InvalidTag(_)
            | NoteServiceError::ParentNotFound(_)
            | NoteServiceError::ParentMustBeFolder(_) => Self::BadRequest(value.to_string()),
            NoteServiceError::NoteNotFound(_) => Self::NotFound(value.to_string()),
            NoteServiceError::CycleDetected { .. } => Self::Conflict(value.to_string()),
            NoteServiceError::Repo(err) => err.into(),
            NoteServiceError::InconsistentState(_) => Self::Internal(value.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(_) => Self::NotFound(value.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(value: SettingsError) -> Self {
        match value {
            SettingsError::Validation(err) => Self::BadRequest(err.to_string()),
            SettingsError::Repo(err) => err.into(),
        }
    }
}

impl From<ConversationServiceError> for ApiError {
    fn from(value: ConversationServiceError) -> Self {
        match value {
            ConversationServiceError::EmptyContent => Self::BadRequest(value.to_string()),
            ConversationServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidScope(_) => Self::BadRequest(value.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(value.body_text())
        } else {
            Self::BadRequest(value.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(value.body_text())
        } else {
            Self::BadRequest(value.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(value: MultipartRejection) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(value.body_text())
        } else {
            Self::BadRequest(value.body_text())
        }
    }
}
