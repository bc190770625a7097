use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repofetch_server::config::Config;
use repofetch_server::{build_router, AppState, GitHubClient, JsonFileStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting repofetch {}", repofetch_server::get_version());

    let config = Config::from_env().context("Failed to load configuration from environment variables")?;

    if config.github_webhook_secret.is_none() {
        warn!("GITHUB_WEBHOOK_SECRET is not set; all webhook deliveries will be rejected");
    }
    if config.installation_id.is_none() {
        warn!("GITHUB_INSTALLATION_ID is not set; /api/repos will answer 400");
    }

    let github_client = GitHubClient::new(
        config.github_app_id,
        config.github_private_key,
        config.github_api_url.clone(),
    )?;

    info!("Using metadata file: {}", config.metadata_path.display());
    let store = JsonFileStore::new(&config.metadata_path);

    let app_state = Arc::new(AppState {
        fetcher: Arc::new(github_client),
        store: Arc::new(store),
        webhook_secret: config.github_webhook_secret,
        installation_id: config.installation_id,
    });

    let app = build_router(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
