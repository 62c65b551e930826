// src/services/renderer.rs
//! Turns stored transcript entries into what the chat page draws.

use serde::{Deserialize, Serialize};

use super::session_manager::{Message, MessageRole};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Model,
    Error,
}

impl From<MessageRole> for DisplayRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => DisplayRole::User,
            MessageRole::Model => DisplayRole::Model,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub role: DisplayRole,
    pub text: String,
}

impl DisplayMessage {
    /// An inline error bubble. Never part of the transcript.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: DisplayRole::Error,
            text: text.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    show_seed: bool,
}

impl Renderer {
    pub fn new(show_seed: bool) -> Self {
        Self { show_seed }
    }

    pub fn render(&self, transcript: &[Message]) -> Vec<DisplayMessage> {
        transcript
            .iter()
            .filter(|m| self.show_seed || !m.seed)
            .map(|m| DisplayMessage {
                role: m.role.into(),
                text: m.content.clone(),
            })
            .collect()
    }
}
