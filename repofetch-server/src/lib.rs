pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod request_log;
pub mod store;
pub mod webhook;

use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use github::{GitHubClient, RepositoryFetcher};
pub use request_log::{CorrelationId, Sanitizer};
pub use store::{InMemoryStore, JsonFileStore, MetadataStore, StoreError};

pub const SERVICE_NAME: &str = "repofetch";

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct AppState {
    pub fetcher: Arc<dyn RepositoryFetcher>,
    pub store: Arc<dyn MetadataStore>,
    /// `None` makes every webhook delivery fail closed.
    pub webhook_secret: Option<String>,
    /// `None` makes `/api/repos` answer 400.
    pub installation_id: Option<u64>,
}

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME
    })))
}

async fn help_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": get_version(),
        "description": "Aggregates the repositories of a GitHub App installation with locally curated metadata",
        "endpoints": [
            {
                "path": "/health",
                "method": "GET",
                "description": "Health check endpoint",
                "authentication": "None"
            },
            {
                "path": "/webhook",
                "method": "POST",
                "description": "GitHub App webhook receiver; seeds metadata when repositories are added to the installation",
                "authentication": "GitHub webhook signature (X-Hub-Signature-256)"
            },
            {
                "path": "/api/repos",
                "method": "GET",
                "description": "Installation repositories merged with metadata",
                "authentication": "None",
                "query_parameters": [
                    "q (substring of name or description, case-insensitive)",
                    "tag (exact metadata tag)",
                    "language (case-insensitive)",
                    "sort (default: stargazers_count)",
                    "order (asc | desc, default: desc)",
                    "page (default: 1)",
                    "per_page (1-100, default: 50)"
                ]
            },
            {
                "path": "/help",
                "method": "GET",
                "description": "API documentation and service information",
                "authentication": "None"
            }
        ],
        "configuration": {
            "required_env_vars": [
                "GITHUB_APP_ID",
                "GITHUB_PRIVATE_KEY or GITHUB_PRIVATE_KEY_PATH"
            ],
            "optional_env_vars": [
                "GITHUB_WEBHOOK_SECRET (webhooks are rejected while unset)",
                "GITHUB_INSTALLATION_ID (/api/repos answers 400 while unset)",
                "GITHUB_API_URL (default: https://api.github.com)",
                "METADATA_PATH (default: data/metadata.json)",
                "PORT (default: 3000)",
                "RUST_LOG (default: info)"
            ]
        }
    }))
}

/// Full HTTP surface over the given state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/help", get(help_handler))
        .merge(webhook::webhook_router(app_state.clone()))
        .merge(api::api_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
