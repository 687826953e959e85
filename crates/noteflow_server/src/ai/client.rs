//! reqwest client for an OpenAI-compatible AI service.
//!
//! - `POST {base}/chat/completions` for chat, edit, minutes and vision.
//! - `POST {base}/audio/asr` with `{ "file_base64": ... }` for transcription.
//!
//! Every completion request disables model "thinking".

use super::{AiBackend, AiError, Attachment, ChatMessage};
use crate::config::ServerConfig;
use async_trait::async_trait;
use log::{info, warn};
use noteflow_core::sanitize_log_value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("noteflow/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct Thinking {
    #[serde(rename = "type")]
    kind: &'static str,
}

const THINKING_DISABLED: Thinking = Thinking { kind: "disabled" };

#[derive(Debug, Serialize)]
struct CompletionRequest<'a, M: Serialize> {
    model: &'a str,
    messages: &'a [M],
    thinking: Thinking,
}

#[derive(Debug, Serialize)]
struct VisionMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: UrlRef },
    FileUrl { file_url: UrlRef },
}

#[derive(Debug, Serialize)]
struct UrlRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AsrRequest {
    file_base64: String,
}

#[derive(Debug, Deserialize)]
struct AsrResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Production [`AiBackend`].
pub struct HttpAiClient {
    http_client: reqwest::Client,
    base_url: String,
    chat_model: String,
    vision_model: String,
    default_api_key: Option<String>,
}

impl HttpAiClient {
    pub fn new(
        base_url: impl Into<String>,
        chat_model: impl Into<String>,
        vision_model: impl Into<String>,
        default_api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chat_model: chat_model.into(),
            vision_model: vision_model.into(),
            default_api_key: default_api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, AiError> {
        Self::new(
            config.ai_base_url.clone(),
            config.chat_model.clone(),
            config.vision_model.clone(),
            config.fallback_api_key().map(str::to_string),
            config.ai_timeout(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
        body: &B,
        api_key: Option<&str>,
    ) -> Result<R, AiError> {
        let started_at = Instant::now();
        let mut request = self.http_client.post(self.endpoint(path)).json(body);
        if let Some(key) = api_key.or(self.default_api_key.as_deref()) {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=ai_call module=ai status=error op={} error_code=request_failed duration_ms={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    sanitize_log_value(&err.to_string(), MAX_ERROR_BODY_CHARS)
                );
                return Err(AiError::Request(err.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = sanitize_log_value(body.trim(), MAX_ERROR_BODY_CHARS);
            warn!(
                "event=ai_call module=ai status=error op={} error_code=upstream_status http_status={} duration_ms={}",
                op,
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(AiError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<R>()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        info!(
            "event=ai_call module=ai status=ok op={} duration_ms={}",
            op,
            started_at.elapsed().as_millis()
        );
        Ok(parsed)
    }
}

#[async_trait]
impl AiBackend for HttpAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        let body = CompletionRequest {
            model: &self.chat_model,
            messages,
            thinking: THINKING_DISABLED,
        };
        let response: CompletionResponse = self
            .post_json("chat", "chat/completions", &body, api_key)
            .await?;
        Ok(first_choice_text(response))
    }

    async fn vision(
        &self,
        prompt: &str,
        attachment: &Attachment,
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        let messages = [vision_message(prompt, attachment)];
        let body = CompletionRequest {
            model: &self.vision_model,
            messages: &messages,
            thinking: THINKING_DISABLED,
        };
        let response: CompletionResponse = self
            .post_json("vision", "chat/completions", &body, api_key)
            .await?;
        Ok(first_choice_text(response))
    }

    async fn transcribe(
        &self,
        audio: &Attachment,
        api_key: Option<&str>,
    ) -> Result<String, AiError> {
        let body = AsrRequest {
            file_base64: audio.to_base64(),
        };
        let response: AsrResponse = self
            .post_json("transcribe", "audio/asr", &body, api_key)
            .await?;
        Ok(response.text.unwrap_or_default())
    }
}

fn vision_message<'a>(prompt: &'a str, attachment: &Attachment) -> VisionMessage<'a> {
    let url = UrlRef {
        url: attachment.data_url(),
    };
    let file_part = if attachment.is_pdf() {
        ContentPart::FileUrl { file_url: url }
    } else {
        ContentPart::ImageUrl { image_url: url }
    };
    VisionMessage {
        role: "user",
        content: vec![ContentPart::Text { text: prompt }, file_part],
    }
}

fn first_choice_text(response: CompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default()
}
