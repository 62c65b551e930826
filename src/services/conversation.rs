// src/services/conversation.rs
use tracing::{info, warn};

use super::gemini::ChatModel;
use super::session_manager::{MessageRole, SessionManager};
use crate::config::PersonaConfig;
use crate::error::{AppError, ModelError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Reply(String),
    /// The call failed; carries the text to show inline.
    Failed(String),
}

/// Run one user turn: record the prompt, ask the model, record the reply.
///
/// A failed call leaves the transcript with the user entry only and the
/// model context untouched, so the next turn starts from the last good
/// exchange. A session that no longer exists is never recreated; the turn
/// ends with `AppError::NotFound` instead.
pub async fn run_turn(
    sessions: &SessionManager,
    model: &dyn ChatModel,
    persona: &PersonaConfig,
    session_id: &str,
    prompt: &str,
) -> Result<TurnOutcome, AppError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let gone = || AppError::NotFound(session_id.to_string());

    sessions
        .append_message(session_id, MessageRole::User, trimmed)
        .await
        .ok_or_else(gone)?;
    let context = sessions.get_context(session_id).await.ok_or_else(gone)?;

    match model.send(&context, trimmed).await {
        Ok(reply) => {
            // The session may have ended while the model was answering.
            sessions
                .append_message(session_id, MessageRole::Model, &reply)
                .await
                .ok_or_else(gone)?;
            sessions
                .commit_exchange(session_id, trimmed, &reply)
                .await
                .ok_or_else(gone)?;
            info!(session_id, reply_len = reply.len(), "turn completed");
            Ok(TurnOutcome::Reply(reply))
        }
        Err(e) => {
            warn!(session_id, error = %e, "turn failed");
            Ok(TurnOutcome::Failed(failure_text(persona, &e)))
        }
    }
}

fn failure_text(persona: &PersonaConfig, error: &ModelError) -> String {
    match error {
        ModelError::Empty | ModelError::Blocked(_) => persona.empty_reply_message.clone(),
        other => format!("{}: {}", persona.call_error_prefix, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_uses_apology() {
        let persona = PersonaConfig::default();
        assert_eq!(failure_text(&persona, &ModelError::Empty), persona.empty_reply_message);
    }

    #[test]
    fn call_error_is_prefixed() {
        let persona = PersonaConfig::default();
        let text = failure_text(&persona, &ModelError::Timeout(60));
        assert!(text.starts_with(&persona.call_error_prefix));
        assert!(text.ends_with("request timed out after 60s"));
    }
}
