//! Metadata store abstraction.
//!
//! The store maps repository full names to [`MetadataRecord`]s. Handlers only
//! talk to the [`MetadataStore`] trait; read-modify-write cycles live inside
//! the implementations, behind their own lock.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use repofetch_core::{MetadataRecord, MetadataSnapshot};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read metadata file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("metadata file {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write metadata file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode metadata: {0}")]
    Encode(serde_json::Error),
}

/// Outcome of [`MetadataStore::upsert_if_absent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Full names that received a fresh zero-value record.
    pub inserted: Vec<String>,
    /// Full names that already had a record, left untouched.
    pub already_present: Vec<String>,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Stored record for `full_name`, if any.
    async fn get(&self, full_name: &str) -> Result<Option<MetadataRecord>, StoreError>;

    /// Ensure a record exists for every name, inserting the zero-value record
    /// where none does. Existing records are never modified.
    ///
    /// Either every insertion is persisted or none is.
    async fn upsert_if_absent(&self, full_names: &[String]) -> Result<UpsertReport, StoreError>;

    /// Consistent snapshot of every stored record.
    async fn all(&self) -> Result<MetadataSnapshot, StoreError>;
}

/// Insert zero-value records for names missing from `snapshot`.
fn insert_missing(snapshot: &mut MetadataSnapshot, full_names: &[String]) -> UpsertReport {
    let mut report = UpsertReport::default();
    for full_name in full_names {
        if snapshot.contains_key(full_name) {
            report.already_present.push(full_name.clone());
        } else {
            snapshot.insert(full_name.clone(), MetadataRecord::default());
            report.inserted.push(full_name.clone());
        }
    }
    report
}
