// src/services/gemini.rs
//! Client for the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::session_manager::Message;
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::secrets::ApiKey;

/// Something that can answer the next user turn given the prior history.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn send(&self, context: &[Message], prompt: &str) -> Result<String, ModelError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
    generation: Option<GenerationConfig>,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey, config: &ModelConfig) -> Result<Self, ModelError> {
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("pharmacist-chat/0.1.0")
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let generation = if config.temperature.is_some() || config.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            })
        } else {
            None
        };

        Ok(Self {
            client,
            api_key,
            model: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            generation,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The client timeout covers both the send and the body read.
    fn transport_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout.as_secs())
        } else {
            ModelError::Transport(e.without_url().to_string())
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn send(&self, context: &[Message], prompt: &str) -> Result<String, ModelError> {
        let request = build_request(context, prompt, self.generation.as_ref());
        debug!(model = %self.model, turns = request.contents.len(), "sending Gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Gemini API returned an error");
            return Err(map_http_error(status, &body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ModelError::Parse(e.to_string()))?;
        extract_text(parsed)
    }
}

// -- Wire format --

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn build_request<'a>(
    context: &'a [Message],
    prompt: &'a str,
    generation: Option<&'a GenerationConfig>,
) -> GenerateContentRequest<'a> {
    let mut contents: Vec<Content<'a>> = context
        .iter()
        .map(|m| Content {
            role: m.role.as_str(),
            parts: [Part { text: &m.content }],
        })
        .collect();
    contents.push(Content {
        role: "user",
        parts: [Part { text: prompt }],
    });
    GenerateContentRequest {
        contents,
        generation_config: generation,
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ModelError> {
    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }
    match response.prompt_feedback.and_then(|f| f.block_reason) {
        Some(reason) => Err(ModelError::Blocked(reason)),
        None => Err(ModelError::Empty),
    }
}

/// Non-JSON error bodies (proxy pages and the like) are cut to this many characters.
const MAX_RAW_ERROR_CHARS: usize = 200;

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn map_http_error(status: StatusCode, body: &str) -> ModelError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(s) if !s.is_empty() => format!("{s}: {msg}"),
                _ => msg,
            }
        })
        .unwrap_or_else(|_| truncate(body.trim(), MAX_RAW_ERROR_CHARS));

    ModelError::Api {
        status: status.as_u16(),
        message,
    }
}
