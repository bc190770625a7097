use crate::model::{MergedView, MetadataRecord, MetadataSnapshot, RepositorySummary};

/// Join provider repositories with their metadata records.
///
/// Output order is input order. A repository without a record gets the
/// zero-value record; the snapshot itself is never modified.
pub fn merge_repositories(
    repositories: Vec<RepositorySummary>,
    metadata: &MetadataSnapshot,
) -> Vec<MergedView> {
    repositories
        .into_iter()
        .map(|repository| {
            let record = record_or_default(metadata, &repository.full_name);
            MergedView::new(repository, record)
        })
        .collect()
}

/// Record for `full_name`, or the zero-value record if none is stored.
pub fn record_or_default(metadata: &MetadataSnapshot, full_name: &str) -> MetadataRecord {
    metadata.get(full_name).cloned().unwrap_or_default()
}
