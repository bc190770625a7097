use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Failures surfaced to HTTP clients.
///
/// Every variant renders as `{"error": "<message>"}`. Server-side variants log
/// their full detail and return a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or invalid signature")]
    AuthenticationFailure,

    #[error("webhook secret is not configured")]
    WebhookSecretMissing,

    #[error("GITHUB_INSTALLATION_ID is not configured")]
    InstallationIdMissing,

    #[error("invalid JSON body: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body")]
    BodyUnreadable,

    #[error("upstream request failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            AppError::WebhookSecretMissing => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InstallationIdMissing => StatusCode::BAD_REQUEST,
            AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BodyUnreadable => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::WebhookSecretMissing => "Server error".to_string(),
            AppError::Upstream(_) => "Failed to fetch repositories".to_string(),
            AppError::Store(_) => "Failed to access repository metadata".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
