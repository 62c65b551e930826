// src/routes/mod.rs
pub mod chat;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use chat::{
    chat_handler, create_session_handler, end_session_handler, page_info_handler,
    transcript_handler,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route(
            "/chat/{session_id}",
            get(transcript_handler).delete(end_session_handler),
        )
        .route("/session", post(create_session_handler))
        .route("/page", get(page_info_handler))
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new("public"))
        .layer(TraceLayer::new_for_http())
}
