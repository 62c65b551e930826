// src/message.rs
use serde::{Deserialize, Serialize};

use crate::services::renderer::DisplayMessage;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub messages: Vec<DisplayMessage>,
}

#[derive(Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub messages: Vec<DisplayMessage>,
}

/// Page strings, so the static page needs no hard-coded copy.
#[derive(Serialize, Deserialize)]
pub struct PageInfo {
    pub title: String,
    pub subtitle: String,
    pub input_placeholder: String,
    pub pending_text: String,
}
