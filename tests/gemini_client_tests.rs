use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use pharmacist_chat::config::ModelConfig;
use pharmacist_chat::error::ModelError;
use pharmacist_chat::secrets::ApiKey;
use pharmacist_chat::services::gemini::{ChatModel, GeminiClient};
use pharmacist_chat::services::session_manager::SeedPair;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

/// Starts a stand-in for the Gemini endpoint and returns its base url.
async fn spawn_mock(reply: (StatusCode, Value), delay: Duration, recorded: Recorded) -> String {
    let app = Router::new()
        .route(
            "/models/{action}",
            post(
                move |State(rec): State<Recorded>,
                      Path(action): Path<String>,
                      headers: HeaderMap,
                      Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        let key = headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        rec.calls.lock().unwrap().push((action, key, body));
                        tokio::time::sleep(delay).await;
                        (reply.0, Json(reply.1))
                    }
                },
            ),
        )
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/models")
}

fn model_config(base_url: String) -> ModelConfig {
    ModelConfig {
        base_url,
        ..ModelConfig::default()
    }
}

#[tokio::test]
async fn sends_history_and_returns_reply() {
    let recorded = Recorded::default();
    let base = spawn_mock(
        (
            StatusCode::OK,
            json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Paracetamol 500 mg."}]}}]}),
        ),
        Duration::ZERO,
        recorded.clone(),
    )
    .await;

    let mut config = model_config(base);
    config.temperature = Some(0.2);
    config.max_output_tokens = Some(200);
    let client = GeminiClient::new(ApiKey::new("test-key"), &config).unwrap();

    let context = SeedPair::new("be a pharmacist", "ok").messages();
    let reply = client.send(&context, "demam").await.unwrap();
    assert_eq!(reply, "Paracetamol 500 mg.");

    let calls = recorded.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (action, key, body) = &calls[0];
    assert_eq!(action, "gemini-1.5-flash:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"].as_array().unwrap().len(), 3);
    assert_eq!(body["contents"][2]["role"], "user");
    assert_eq!(body["contents"][2]["parts"][0]["text"], "demam");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
}

#[tokio::test]
async fn generation_config_omitted_by_default() {
    let recorded = Recorded::default();
    let base = spawn_mock(
        (
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}),
        ),
        Duration::ZERO,
        recorded.clone(),
    )
    .await;

    let client = GeminiClient::new(ApiKey::new("k"), &model_config(base)).unwrap();
    client.send(&[], "hi").await.unwrap();

    let calls = recorded.calls.lock().unwrap();
    assert!(calls[0].2.get("generationConfig").is_none());
}

#[tokio::test]
async fn api_error_is_reported_once_without_retry() {
    let recorded = Recorded::default();
    let base = spawn_mock(
        (
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}),
        ),
        Duration::ZERO,
        recorded.clone(),
    )
    .await;

    let client = GeminiClient::new(ApiKey::new("bad"), &model_config(base)).unwrap();
    let err = client.send(&[], "hi").await.unwrap_err();
    match err {
        ModelError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "PERMISSION_DENIED: API key not valid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(recorded.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_candidates_is_empty_error() {
    let base = spawn_mock(
        (StatusCode::OK, json!({"candidates": []})),
        Duration::ZERO,
        Recorded::default(),
    )
    .await;

    let client = GeminiClient::new(ApiKey::new("k"), &model_config(base)).unwrap();
    let err = client.send(&[], "hi").await.unwrap_err();
    assert!(matches!(err, ModelError::Empty));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let base = spawn_mock(
        (
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "late"}]}}]}),
        ),
        Duration::from_secs(3),
        Recorded::default(),
    )
    .await;

    let mut config = model_config(base);
    config.timeout_secs = 1;
    let client = GeminiClient::new(ApiKey::new("k"), &config).unwrap();
    let err = client.send(&[], "hi").await.unwrap_err();
    assert!(matches!(err, ModelError::Timeout(1)));
}

#[tokio::test]
async fn stalled_body_times_out() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Headers arrive at once; the body never finishes.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"cand")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut config = model_config(format!("http://{addr}/models"));
    config.timeout_secs = 1;
    let client = GeminiClient::new(ApiKey::new("k"), &config).unwrap();
    let err = client.send(&[], "hi").await.unwrap_err();
    assert!(matches!(err, ModelError::Timeout(1)), "got {err:?}");
}
