//! Typed schemas for the two sides of the repository join and the view they
//! produce.
//!
//! `RepositorySummary` is owned by the hosting provider and is never mutated
//! here. `MetadataRecord` is owned by the metadata store. `MergedView` exists
//! only for the duration of one listing request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag that marks a repository as an AI project.
pub const AI_TAG: &str = "ai";

/// A repository as reported by the hosting provider.
///
/// Unknown provider fields are ignored. Everything except the identity fields
/// defaults when absent so that partial payloads still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    /// Size in kilobytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub default_branch: String,
}

/// User-owned annotations for a repository, keyed by full name in the store.
///
/// `MetadataRecord::default()` is the zero-value record. A missing key and a
/// zero-value record mean the same thing to every reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MetadataRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Point-in-time copy of the whole metadata store.
pub type MetadataSnapshot = BTreeMap<String, MetadataRecord>;

/// A repository summary joined with its metadata record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedView {
    #[serde(flatten)]
    pub repository: RepositorySummary,
    /// Tag-based AI flag; identical to `tagged_ai`.
    pub is_ai_project: bool,
    pub tagged_ai: bool,
    /// Name-based AI flag: the repository name contains "ai", ignoring case.
    pub name_matches_ai: bool,
    pub metadata: MetadataRecord,
}

impl MergedView {
    pub fn new(repository: RepositorySummary, metadata: MetadataRecord) -> Self {
        let tagged_ai = metadata.has_tag(AI_TAG);
        let name_matches_ai = repository.name.to_lowercase().contains(AI_TAG);
        Self {
            repository,
            is_ai_project: tagged_ai,
            tagged_ai,
            name_matches_ai,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(name: &str) -> RepositorySummary {
        serde_json::from_value(json!({
            "id": 1,
            "name": name,
            "full_name": format!("org/{}", name),
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_ignores_unknown_provider_fields() {
        let repo: RepositorySummary = serde_json::from_value(json!({
            "id": 7,
            "node_id": "R_kgDO",
            "name": "tool",
            "full_name": "org/tool",
            "owner": { "login": "org" },
            "language": "Rust",
            "stargazers_count": 3,
            "topics": ["cli"]
        }))
        .unwrap();

        assert_eq!(repo.full_name, "org/tool");
        assert_eq!(repo.language.as_deref(), Some("Rust"));
        assert_eq!(repo.stargazers_count, 3);
        assert_eq!(repo.description, None);
        assert_eq!(repo.default_branch, "");
    }

    #[test]
    fn test_partial_metadata_record_fills_zero_values() {
        let record: MetadataRecord = serde_json::from_value(json!({ "priority": 2 })).unwrap();
        assert_eq!(
            record,
            MetadataRecord {
                priority: 2,
                ..MetadataRecord::default()
            }
        );
    }

    #[test]
    fn test_zero_value_record_serializes_notes_as_null() {
        let value = serde_json::to_value(MetadataRecord::default()).unwrap();
        assert_eq!(
            value,
            json!({ "tags": [], "priority": 0, "highlighted": false, "notes": null })
        );
    }

    #[test]
    fn test_ai_flags_are_independent() {
        let tagged = MergedView::new(
            summary("backend"),
            MetadataRecord {
                tags: vec!["ai".to_string()],
                ..MetadataRecord::default()
            },
        );
        assert!(tagged.is_ai_project);
        assert!(tagged.tagged_ai);
        assert!(!tagged.name_matches_ai);

        let named = MergedView::new(summary("My-AI-Tool"), MetadataRecord::default());
        assert!(!named.is_ai_project);
        assert!(!named.tagged_ai);
        assert!(named.name_matches_ai);
    }

    #[test]
    fn test_ai_tag_match_is_exact() {
        let view = MergedView::new(
            summary("x"),
            MetadataRecord {
                tags: vec!["AI".to_string(), "ai-tools".to_string()],
                ..MetadataRecord::default()
            },
        );
        assert!(!view.tagged_ai);
    }

    #[test]
    fn test_merged_view_shape() {
        let repo: RepositorySummary = serde_json::from_value(json!({
            "id": 42,
            "name": "my-ai-tool",
            "full_name": "org/my-ai-tool",
            "description": "Helpers",
            "private": true,
            "html_url": "https://github.com/org/my-ai-tool",
            "clone_url": "https://github.com/org/my-ai-tool.git",
            "ssh_url": "git@github.com:org/my-ai-tool.git",
            "url": "https://api.github.com/repos/org/my-ai-tool",
            "language": "Rust",
            "stargazers_count": 5,
            "forks_count": 1,
            "open_issues_count": 2,
            "size": 120,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-02-01T00:00:00Z",
            "pushed_at": "2024-03-01T00:00:00Z",
            "default_branch": "main"
        }))
        .unwrap();
        let view = MergedView::new(
            repo,
            MetadataRecord {
                tags: vec!["ai".to_string()],
                priority: 3,
                highlighted: true,
                notes: Some("keep".to_string()),
            },
        );

        insta::assert_json_snapshot!(view, @r###"
        {
          "id": 42,
          "name": "my-ai-tool",
          "full_name": "org/my-ai-tool",
          "description": "Helpers",
          "private": true,
          "html_url": "https://github.com/org/my-ai-tool",
          "clone_url": "https://github.com/org/my-ai-tool.git",
          "ssh_url": "git@github.com:org/my-ai-tool.git",
          "url": "https://api.github.com/repos/org/my-ai-tool",
          "language": "Rust",
          "stargazers_count": 5,
          "forks_count": 1,
          "open_issues_count": 2,
          "size": 120,
          "created_at": "2024-01-01T00:00:00Z",
          "updated_at": "2024-02-01T00:00:00Z",
          "pushed_at": "2024-03-01T00:00:00Z",
          "default_branch": "main",
          "is_ai_project": true,
          "tagged_ai": true,
          "name_matches_ai": true,
          "metadata": {
            "tags": [
              "ai"
            ],
            "priority": 3,
            "highlighted": true,
            "notes": "keep"
          }
        }
        "###);
    }
}
