//! Interpretation of verified GitHub App webhook deliveries.
//!
//! Only two event/action pairs matter here. Everything else is parsed just far
//! enough to prove the body is JSON and is then ignored.

use serde::Deserialize;
use serde_json::Value;

/// `X-GitHub-Event` value for repository grant changes on an installation.
pub const INSTALLATION_REPOSITORIES_EVENT: &str = "installation_repositories";
/// `X-GitHub-Event` value for installation lifecycle changes.
pub const INSTALLATION_EVENT: &str = "installation";

/// Entry of `repositories_added`. GitHub only sends a handful of fields here.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GrantedRepository {
    pub full_name: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub private: bool,
}

/// What a verified delivery asks this system to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `installation_repositories` / `added`: seed metadata for each repository.
    RepositoriesAdded {
        installation_id: Option<u64>,
        repositories: Vec<GrantedRepository>,
    },
    /// `installation` / `new_permissions_accepted`: observed, nothing to store.
    PermissionsAccepted { installation_id: Option<u64> },
    Ignored {
        event: String,
        action: Option<String>,
    },
}

impl WebhookEvent {
    /// Parse a delivery body for the given `X-GitHub-Event` value.
    ///
    /// The body must be valid JSON whatever the event type. Its shape is only
    /// checked for the event/action pairs that are acted on.
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let payload: Value = serde_json::from_slice(body)?;
        let action = payload.get("action").and_then(Value::as_str);
        let installation_id = payload.pointer("/installation/id").and_then(Value::as_u64);

        let event = match (event_type, action) {
            (INSTALLATION_REPOSITORIES_EVENT, Some("added")) => {
                let repositories = match payload.get("repositories_added") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(added) => Vec::<GrantedRepository>::deserialize(added)?,
                };
                WebhookEvent::RepositoriesAdded {
                    installation_id,
                    repositories,
                }
            }
            (INSTALLATION_EVENT, Some("new_permissions_accepted")) => {
                WebhookEvent::PermissionsAccepted { installation_id }
            }
            _ => WebhookEvent::Ignored {
                event: event_type.to_string(),
                action: action.map(str::to_string),
            },
        };

        Ok(event)
    }

    /// Full names of the repositories whose metadata should exist after this event.
    pub fn seeded_full_names(&self) -> Vec<String> {
        match self {
            WebhookEvent::RepositoriesAdded { repositories, .. } => repositories
                .iter()
                .map(|r| r.full_name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}
