//! Flat JSON file implementation of `MetadataStore`.
//!
//! The whole mapping lives in one pretty-printed JSON document. It is loaded
//! wholesale on every operation and rewritten wholesale on mutation.
//!
//! # Concurrency
//!
//! A single async mutex covers the load → modify → write cycle, so two
//! deliveries that add disjoint keys cannot overwrite each other from stale
//! reads. Writes land in a sibling temp file that is synced and then renamed
//! over the document; readers therefore see either the old or the new
//! document, never a partial one, and do not take the lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use repofetch_core::{MetadataRecord, MetadataSnapshot};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{insert_missing, MetadataStore, StoreError, UpsertReport};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing or blank file is an empty mapping.
    async fn load(&self) -> Result<MetadataSnapshot, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Metadata file {} not found, treating as empty", self.path.display());
                return Ok(MetadataSnapshot::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(MetadataSnapshot::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "metadata.json".to_string());
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }

    /// Replace the document atomically.
    async fn save(&self, snapshot: &MetadataSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(write_err)?;
        file.write_all(&json).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }

        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonFileStore {
    async fn get(&self, full_name: &str) -> Result<Option<MetadataRecord>, StoreError> {
        Ok(self.load().await?.remove(full_name))
    }

    async fn upsert_if_absent(&self, full_names: &[String]) -> Result<UpsertReport, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.load().await?;
        let report = insert_missing(&mut snapshot, full_names);

        if report.inserted.is_empty() {
            return Ok(report);
        }

        self.save(&snapshot).await?;
        info!(
            "Persisted {} new metadata record(s) to {}",
            report.inserted.len(),
            self.path.display()
        );
        Ok(report)
    }

    async fn all(&self) -> Result<MetadataSnapshot, StoreError> {
        self.load().await
    }
}
