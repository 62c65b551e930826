use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, PageInfo, TranscriptResponse},
    services::{
        conversation::{TurnOutcome, run_turn},
        renderer::DisplayMessage,
    },
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let session_id = match &payload.session_id {
        Some(s) if !s.trim().is_empty() => state.sessions.ensure_session(s.trim()).await,
        _ => state.sessions.create_session().await,
    };

    let outcome = run_turn(
        &state.sessions,
        state.model.as_ref(),
        &state.persona,
        &session_id,
        &payload.message,
    )
    .await?;

    let history = state.sessions.get_history(&session_id).await.unwrap_or_default();
    let mut messages = state.renderer.render(&history);

    let (reply, error) = match outcome {
        TurnOutcome::Reply(reply) => (Some(reply), None),
        TurnOutcome::Failed(text) => {
            messages.push(DisplayMessage::error(&text));
            (None, Some(text))
        }
    };

    Ok(Json(ChatResponse {
        session_id,
        reply,
        error,
        messages,
    }))
}

pub async fn create_session_handler(State(state): State<SharedState>) -> Json<TranscriptResponse> {
    let session_id = state.sessions.create_session().await;
    info!(%session_id, "session started");
    let history = state.sessions.get_history(&session_id).await.unwrap_or_default();
    Json(TranscriptResponse {
        messages: state.renderer.render(&history),
        session_id,
    })
}

pub async fn transcript_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let history = state
        .sessions
        .get_history(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(session_id.clone()))?;
    Ok(Json(TranscriptResponse {
        messages: state.renderer.render(&history),
        session_id,
    }))
}

pub async fn end_session_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove_session(&session_id).await {
        info!(%session_id, "session ended");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(session_id))
    }
}

pub async fn page_info_handler(State(state): State<SharedState>) -> Json<PageInfo> {
    let persona = &state.persona;
    Json(PageInfo {
        title: persona.title.clone(),
        subtitle: persona.subtitle.clone(),
        input_placeholder: persona.input_placeholder.clone(),
        pending_text: persona.pending_text.clone(),
    })
}
