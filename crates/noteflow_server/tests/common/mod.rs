//! Shared fixtures for router tests: in-memory app plus a scripted AI backend.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use noteflow_server::ai::{AiBackend, AiError, Attachment, ChatMessage};
use noteflow_server::{build_router, AppState};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const BOUNDARY: &str = "noteflow-test-boundary";

/// One call seen by [`FakeAi`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub op: &'static str,
    pub messages: Vec<ChatMessage>,
    pub prompt: Option<String>,
    pub file_name: Option<String>,
    pub api_key: Option<String>,
}

/// Returns canned text and records every request.
#[derive(Default)]
pub struct FakeAi {
    pub chat_reply: String,
    pub vision_reply: String,
    pub transcript: String,
    /// When set, every call fails with this upstream status.
    pub fail_status: Option<u16>,
    pub recorded: Mutex<Vec<RecordedCall>>,
}

impl FakeAi {
    pub fn replying(chat_reply: &str) -> Self {
        Self {
            chat_reply: chat_reply.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> Result<(), AiError> {
        self.recorded.lock().unwrap().push(call);
        match self.fail_status {
            Some(status) => Err(AiError::Upstream {
                status,
                message: "upstream unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AiBackend for FakeAi {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        self.record(RecordedCall {
            op: "chat",
            messages: messages.to_vec(),
            prompt: None,
            file_name: None,
            api_key: api_key.map(str::to_string),
        })?;
        Ok(self.chat_reply.clone())
    }

    async fn vision(
        &self,
        prompt: &str,
        attachment: &Attachment,
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        self.record(RecordedCall {
            op: "vision",
            messages: Vec::new(),
            prompt: Some(prompt.to_string()),
            file_name: Some(attachment.file_name.clone()),
            api_key: api_key.map(str::to_string),
        })?;
        Ok(self.vision_reply.clone())
    }

    async fn transcribe(
        &self,
        audio: &Attachment,
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        self.record(RecordedCall {
            op: "transcribe",
            messages: Vec::new(),
            prompt: None,
            file_name: Some(audio.file_name.clone()),
            api_key: api_key.map(str::to_string),
        })?;
        Ok(self.transcript.clone())
    }
}

pub fn test_app(ai: Arc<FakeAi>) -> Router {
    let conn = noteflow_core::open_db_in_memory().unwrap();
    build_router(AppState::new(conn, ai))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Builds a `multipart/form-data` POST with text fields and an optional
/// `file` part given as (file name, content type, bytes).
pub fn multipart_request(
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
