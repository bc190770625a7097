use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_METADATA_PATH: &str = "data/metadata.json";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone)]
pub struct Config {
    pub github_app_id: u64,
    pub github_private_key: String,
    /// Shared secret for webhook signatures.
    /// If not set, every webhook delivery is rejected with a server error.
    pub github_webhook_secret: Option<String>,
    /// Installation whose repositories `/api/repos` lists.
    /// If not set, `/api/repos` returns 400.
    pub installation_id: Option<u64>,
    pub github_api_url: String,
    pub metadata_path: PathBuf,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("github_app_id", &self.github_app_id)
            .field("github_private_key", &"[REDACTED]")
            .field(
                "github_webhook_secret",
                &self.github_webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("installation_id", &self.installation_id)
            .field("github_api_url", &self.github_api_url)
            .field("metadata_path", &self.metadata_path)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_app_id = lookup("GITHUB_APP_ID")
            .context("GITHUB_APP_ID environment variable is required")?
            .trim()
            .parse::<u64>()
            .context("GITHUB_APP_ID must be a valid number")?;

        let github_private_key = match (
            non_blank(lookup("GITHUB_PRIVATE_KEY")),
            non_blank(lookup("GITHUB_PRIVATE_KEY_PATH")),
        ) {
            (Some(key), _) => key.replace("\\n", "\n"),
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read GITHUB_PRIVATE_KEY_PATH {}", path))?,
            (None, None) => bail!(
                "GITHUB_PRIVATE_KEY or GITHUB_PRIVATE_KEY_PATH environment variable is required"
            ),
        };

        let github_webhook_secret = parse_webhook_secret(lookup("GITHUB_WEBHOOK_SECRET"));
        let installation_id = parse_installation_id(lookup("GITHUB_INSTALLATION_ID"))?;

        let github_api_url = non_blank(lookup("GITHUB_API_URL"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        let metadata_path = non_blank(lookup("METADATA_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_PATH));

        let port = match non_blank(lookup("PORT")) {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            github_app_id,
            github_private_key,
            github_webhook_secret,
            installation_id,
            github_api_url,
            metadata_path,
            port,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse GITHUB_WEBHOOK_SECRET from an optional string value.
///
/// Returns None if the value is missing, empty, or whitespace only, so that an
/// empty secret can never be used to sign or verify deliveries.
pub fn parse_webhook_secret(value: Option<String>) -> Option<String> {
    non_blank(value)
}

/// Parse GITHUB_INSTALLATION_ID from an optional string value.
///
/// Missing, blank, and `0` all mean "not configured". Anything else that is
/// not a positive integer is a configuration error.
pub fn parse_installation_id(value: Option<String>) -> Result<Option<u64>> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };
    let id = raw
        .trim()
        .parse::<u64>()
        .context("GITHUB_INSTALLATION_ID must be a valid number")?;
    Ok((id != 0).then_some(id))
}
