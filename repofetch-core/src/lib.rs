pub mod event;
pub mod merge;
pub mod model;
pub mod query;
pub mod signature;

pub use event::{GrantedRepository, WebhookEvent};
pub use merge::{merge_repositories, record_or_default};
pub use model::{MergedView, MetadataRecord, MetadataSnapshot, RepositorySummary, AI_TAG};
pub use query::{run_query, RepoPage, RepoQuery, RepoQueryParams, SortField, SortOrder};
pub use signature::{sign_payload, verify_signature, SIGNATURE_PREFIX};
