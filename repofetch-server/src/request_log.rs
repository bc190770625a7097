//! Correlation ids and header redaction for request logging.
//!
//! Inbound webhook deliveries are stamped with a [`CorrelationId`] by the
//! signature middleware. Outbound GitHub calls carry their caller's id as a
//! request extension, and [`RequestLogMiddleware`] forwards it in
//! `X-Correlation-ID`.

use axum::http::{self, HeaderMap};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result as MiddlewareResult};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const REDACTED: &str = "[REDACTED]";

/// Header names whose values must never reach the logs.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-hub-signature",
    "x-hub-signature-256",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Sanitizer;

impl Sanitizer {
    /// Header map as loggable name/value pairs, sensitive values redacted.
    /// Non-UTF-8 values are dropped.
    pub fn sanitize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                let name = name.as_str().to_lowercase();
                let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                    REDACTED.to_string()
                } else {
                    value.to_string()
                };
                Some((name, value))
            })
            .collect()
    }
}

/// Outbound request logger for the GitHub client.
pub struct RequestLogMiddleware {
    service: &'static str,
}

impl RequestLogMiddleware {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        let correlation_id = correlation_id_for(req.headers(), extensions);

        if !req.headers().contains_key(CORRELATION_ID_HEADER) {
            // A UUID is always a valid header value.
            if let Ok(value) = correlation_id.0.parse() {
                req.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
        }

        let method = req.method().clone();
        let path = req.url().path().to_string();
        debug!(
            correlation_id = %correlation_id,
            headers = ?Sanitizer::sanitize_headers(req.headers()),
            "{} request: {} {}",
            self.service,
            method,
            path
        );

        let started = Instant::now();
        let response = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &response {
            Ok(resp) => info!(
                correlation_id = %correlation_id,
                status = resp.status().as_u16(),
                elapsed_ms,
                "{} {} {}",
                self.service,
                method,
                path
            ),
            Err(err) => warn!(
                correlation_id = %correlation_id,
                elapsed_ms,
                "{} {} {} failed: {}",
                self.service,
                method,
                path,
                err
            ),
        }

        response
    }
}

/// Existing header value, then request extensions, then a fresh id.
fn correlation_id_for(headers: &HeaderMap, extensions: &http::Extensions) -> CorrelationId {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| CorrelationId(v.to_string()))
        .or_else(|| extensions.get::<CorrelationId>().cloned())
        .unwrap_or_else(CorrelationId::generate)
}
