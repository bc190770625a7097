use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use repofetch_core::RepositorySummary;
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::request_log::{CorrelationId, RequestLogMiddleware};

/// Page size for `GET /installation/repositories`; GitHub's maximum.
pub const REPOSITORIES_PER_PAGE: usize = 100;

/// Cached installation tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Source of the repositories an installation can see.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// `correlation_id` is forwarded on every upstream request made on its behalf.
    async fn fetch_repositories(
        &self,
        installation_id: u64,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<RepositorySummary>>;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: ClientWithMiddleware,
    app_id: u64,
    private_key: String,
    api_base: String,
    token_cache: Arc<RwLock<HashMap<u64, (String, SystemTime)>>>,
}

#[derive(Debug, Serialize)]
struct GitHubAppClaims {
    iss: u64,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: String,
}

#[derive(Debug, Deserialize)]
struct InstallationRepositoriesResponse {
    total_count: u64,
    repositories: Vec<RepositorySummary>,
}

impl GitHubClient {
    pub fn new(app_id: u64, private_key: String, api_base: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: create_github_client()?,
            app_id,
            private_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn generate_jwt(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("Failed to get current time")?
            .as_secs();

        let claims = GitHubAppClaims {
            iss: self.app_id,
            iat: now.saturating_sub(60),
            exp: now + 600,
        };

        let header = Header::new(Algorithm::RS256);
        let encoding_key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .context("Failed to parse private key")?;

        encode(&header, &claims, &encoding_key).context("Failed to encode JWT")
    }

    async fn get_installation_token(
        &self,
        installation_id: u64,
        correlation_id: &CorrelationId,
    ) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some((token, expires_at)) = cache.get(&installation_id) {
                if token_is_fresh(*expires_at, SystemTime::now()) {
                    return Ok(token.clone());
                }
            }
        }

        let jwt = self.generate_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, installation_id
        );

        info!(installation_id, "Requesting new installation access token");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", jwt))
            .header("Accept", GITHUB_ACCEPT)
            .with_extension(correlation_id.clone())
            .send()
            .await
            .context("Failed to send installation token request")?;
        let response = ensure_success(response, "GitHub App token request").await?;

        let token_response: InstallationTokenResponse = response
            .json()
            .await
            .context("Failed to parse installation token response")?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&token_response.expires_at)
            .context("Failed to parse token expiration")?
            .with_timezone(&Utc);
        let expires_at_system =
            UNIX_EPOCH + Duration::from_secs(expires_at.timestamp().max(0) as u64);

        {
            let mut cache = self.token_cache.write().await;
            cache.insert(
                installation_id,
                (token_response.token.clone(), expires_at_system),
            );
        }

        info!(installation_id, "Successfully obtained installation access token");
        Ok(token_response.token)
    }

    /// Every repository the installation has been granted, across all pages.
    pub async fn list_installation_repositories(
        &self,
        installation_id: u64,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<RepositorySummary>> {
        let token = self
            .get_installation_token(installation_id, correlation_id)
            .await?;
        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/installation/repositories?per_page={}&page={}",
                self.api_base, REPOSITORIES_PER_PAGE, page
            );

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .header("Accept", GITHUB_ACCEPT)
                .with_extension(correlation_id.clone())
                .send()
                .await
                .context("Failed to send installation repositories request")?;
            let response = ensure_success(response, "Listing installation repositories").await?;

            let body: InstallationRepositoriesResponse = response
                .json()
                .await
                .context("Failed to parse installation repositories response")?;

            let page_len = body.repositories.len();
            repositories.extend(body.repositories);
            debug!(
                page,
                page_len,
                fetched = repositories.len(),
                total_count = body.total_count,
                "Fetched installation repositories page"
            );

            if is_last_page(page_len, repositories.len(), body.total_count) {
                break;
            }
            page += 1;
        }

        info!(
            installation_id,
            correlation_id = %correlation_id,
            count = repositories.len(),
            "Listed installation repositories"
        );
        Ok(repositories)
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubClient {
    async fn fetch_repositories(
        &self,
        installation_id: u64,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<RepositorySummary>> {
        self.list_installation_repositories(installation_id, correlation_id)
            .await
    }
}

/// Pass 2xx responses through; anything else becomes an error carrying the
/// status and body text.
async fn ensure_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .context("Failed to read error response body")?;
    error!("{} failed: {} - {}", what, status, error_text);
    Err(anyhow!("{} failed: {} - {}", what, status, error_text))
}

/// A cached token is reused while more than the refresh margin remains.
fn token_is_fresh(expires_at: SystemTime, now: SystemTime) -> bool {
    expires_at
        .duration_since(now)
        .map(|remaining| remaining > TOKEN_REFRESH_MARGIN)
        .unwrap_or(false)
}

/// Pagination stops on a short page or once `total_count` items are in hand.
fn is_last_page(page_len: usize, fetched: usize, total_count: u64) -> bool {
    page_len < REPOSITORIES_PER_PAGE || fetched as u64 >= total_count
}

pub fn create_github_client() -> Result<ClientWithMiddleware> {
    use reqwest_middleware::ClientBuilder;

    let client = Client::builder()
        .user_agent(concat!("repofetch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    Ok(ClientBuilder::new(client)
        .with(RequestLogMiddleware::new("github"))
        .build())
}
