//! In-memory implementation of `MetadataStore`, used in tests.

use async_trait::async_trait;
use repofetch_core::{MetadataRecord, MetadataSnapshot};
use tokio::sync::RwLock;

use super::{insert_missing, MetadataStore, StoreError, UpsertReport};

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<MetadataSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: MetadataSnapshot) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn get(&self, full_name: &str) -> Result<Option<MetadataRecord>, StoreError> {
        Ok(self.records.read().await.get(full_name).cloned())
    }

    async fn upsert_if_absent(&self, full_names: &[String]) -> Result<UpsertReport, StoreError> {
        let mut records = self.records.write().await;
        Ok(insert_missing(&mut records, full_names))
    }

    async fn all(&self) -> Result<MetadataSnapshot, StoreError> {
        Ok(self.records.read().await.clone())
    }
}
