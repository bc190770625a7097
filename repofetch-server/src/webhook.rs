use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    middleware::{self, Next},
    response::{Json, Response},
    routing::post,
    Router,
};
use futures_util::StreamExt;
use repofetch_core::{verify_signature, WebhookEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::request_log::{CorrelationId, Sanitizer};
use crate::store::{MetadataStore, StoreError};
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Largest webhook body accepted; GitHub caps deliveries at 25 MiB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
}

/// What handling a verified delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Seeded {
        inserted: Vec<String>,
        already_present: Vec<String>,
    },
    PermissionsAccepted {
        installation_id: Option<u64>,
    },
    Ignored {
        event: String,
        action: Option<String>,
    },
}

impl WebhookOutcome {
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Seeded {
                inserted,
                already_present,
            } => format!(
                "Seeded metadata for {} repositor{} ({} already present)",
                inserted.len(),
                if inserted.len() == 1 { "y" } else { "ies" },
                already_present.len()
            ),
            WebhookOutcome::PermissionsAccepted { .. } => "New permissions accepted".to_string(),
            WebhookOutcome::Ignored { .. } => "Event ignored".to_string(),
        }
    }
}

fn get_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Collect a request body, failing with 413 as soon as it grows past `limit`.
/// Covers chunked bodies that declare no length up front.
async fn read_body_limited(
    body: Body,
    limit: usize,
    correlation_id: &CorrelationId,
) -> Result<Vec<u8>, AppError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            warn!(correlation_id = %correlation_id, "Failed to read webhook body: {}", e);
            AppError::BodyUnreadable
        })?;
        if buf.len() + chunk.len() > limit {
            warn!(
                correlation_id = %correlation_id,
                "Rejecting webhook: body exceeds {} bytes",
                limit
            );
            return Err(AppError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

/// Reject any delivery whose body does not carry a valid signature.
///
/// Runs before the handler and before any JSON parsing. The verified bytes are
/// put back into the request for the handler, together with a fresh
/// [`CorrelationId`] in the request extensions.
async fn verify_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        error!("Rejecting webhook: GITHUB_WEBHOOK_SECRET is not configured");
        return Err(AppError::WebhookSecretMissing);
    };

    let correlation_id = CorrelationId::generate();

    let (parts, body) = request.into_parts();

    let declared_length = get_header(&parts.headers, CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > MAX_WEBHOOK_BODY_BYTES) {
        warn!(
            correlation_id = %correlation_id,
            "Rejecting webhook: declared body length {:?} exceeds limit",
            declared_length
        );
        return Err(AppError::PayloadTooLarge {
            limit: MAX_WEBHOOK_BODY_BYTES,
        });
    }

    let bytes = read_body_limited(body, MAX_WEBHOOK_BODY_BYTES, &correlation_id).await?;

    let Some(signature) = get_header(&parts.headers, SIGNATURE_HEADER) else {
        warn!(correlation_id = %correlation_id, "Rejecting webhook: missing signature header");
        return Err(AppError::AuthenticationFailure);
    };

    if !verify_signature(secret, &bytes, signature) {
        warn!(correlation_id = %correlation_id, "Rejecting webhook: invalid signature");
        return Err(AppError::AuthenticationFailure);
    }

    debug!(
        correlation_id = %correlation_id,
        headers = ?Sanitizer::sanitize_headers(&parts.headers),
        body_len = bytes.len(),
        "Verified webhook delivery"
    );

    let mut new_request = Request::from_parts(parts, Body::from(bytes));
    new_request.extensions_mut().insert(correlation_id);

    Ok(next.run(new_request).await)
}

pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<WebhookResponse>, AppError> {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_else(CorrelationId::generate);

    let (parts, body) = request.into_parts();
    let event_type = get_header(&parts.headers, EVENT_HEADER).unwrap_or_default();
    let delivery_id = get_header(&parts.headers, DELIVERY_HEADER).unwrap_or("unknown");

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| AppError::BodyUnreadable)?;

    let event = WebhookEvent::parse(event_type, &bytes).map_err(|e| {
        warn!(
            correlation_id = %correlation_id,
            delivery_id,
            "Malformed webhook payload for event {:?}: {}",
            event_type,
            e
        );
        AppError::MalformedInput(e)
    })?;

    let outcome = handle_event(state.store.as_ref(), &event).await?;

    info!(
        correlation_id = %correlation_id,
        delivery_id,
        event = event_type,
        "Handled webhook: {:?}",
        outcome
    );

    Ok(Json(WebhookResponse {
        message: outcome.message(),
    }))
}

/// Apply a verified event to the metadata store.
pub async fn handle_event(
    store: &dyn MetadataStore,
    event: &WebhookEvent,
) -> Result<WebhookOutcome, StoreError> {
    match event {
        WebhookEvent::RepositoriesAdded {
            installation_id, ..
        } => {
            let full_names = event.seeded_full_names();
            let report = store.upsert_if_absent(&full_names).await.map_err(|e| {
                error!(
                    ?installation_id,
                    "Failed to seed metadata for {} repositories: {}",
                    full_names.len(),
                    e
                );
                e
            })?;
            info!(
                ?installation_id,
                inserted = ?report.inserted,
                already_present = ?report.already_present,
                "Repositories added to installation"
            );
            Ok(WebhookOutcome::Seeded {
                inserted: report.inserted,
                already_present: report.already_present,
            })
        }
        WebhookEvent::PermissionsAccepted { installation_id } => {
            info!(?installation_id, "New permissions accepted for installation");
            Ok(WebhookOutcome::PermissionsAccepted {
                installation_id: *installation_id,
            })
        }
        WebhookEvent::Ignored { event, action } => {
            debug!("Ignoring webhook event {} / {:?}", event, action);
            Ok(WebhookOutcome::Ignored {
                event: event.clone(),
                action: action.clone(),
            })
        }
    }
}

pub fn webhook_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(github_webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_webhook_signature,
        ))
}
