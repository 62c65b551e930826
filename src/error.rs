// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the Gemini API key.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Gemini API key not found. Set one of [{}] in a secrets file or the environment", .keys.join(", "))]
    Missing { keys: Vec<String> },

    #[error("Failed to read secrets file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse secrets file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failure of a single call to the hosted model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not parse response: {0}")]
    Parse(String),

    #[error("prompt blocked: {0}")]
    Blocked(String),

    #[error("response contained no text")]
    Empty,
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("session {0} not found")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
