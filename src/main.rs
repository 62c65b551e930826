use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use pharmacist_chat::{
    config::{CONFIG_PATH_ENV, Config},
    routes,
    secrets::SecretLoader,
    services::gemini::GeminiClient,
    state::AppState,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pharmacist_chat=info,tower_http=info")),
        )
        .init();

    let config_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let config = Config::discover(config_path.as_deref())?;
    config.validate()?;

    // No key, no service: the error is reported once, by the returned Err.
    let secret = SecretLoader::from_config(&config.secrets).load()?;
    info!(source = %secret.source, key = %secret.name, "loaded Gemini API key");

    let model = GeminiClient::new(secret.key, &config.model)?;
    info!(model = model.model(), "Gemini client ready");

    let state = Arc::new(AppState::from_config(&config, Arc::new(model)));
    let app = routes::create_router()
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("pharmacist chat running at http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
