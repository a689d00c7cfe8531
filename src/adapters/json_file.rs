use crate::adapters::memory::InMemoryStore;
use crate::core::DocumentStore;
use crate::domain::ports::{BatchOperation, Document};
use crate::utils::error::StorageResult;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Document store persisted as a single JSON snapshot file.
///
/// Reads are served from an [`InMemoryStore`]. Every mutation is applied to a
/// copy of the documents, written to disk, and only then made visible, so a
/// failed write leaves both the file and the in-memory state unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let documents: HashMap<String, Document> = if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read(&path).await?;
            if raw.is_empty() {
                HashMap::new()
            } else {
                serde_json::from_slice(&raw)?
            }
        } else {
            HashMap::new()
        };

        tracing::debug!("Opened {} with {} documents", path.display(), documents.len());

        Ok(Self {
            path,
            inner: InMemoryStore::from_documents(documents),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `data` at `path` unconditionally, e.g. to seed business records.
    pub async fn insert(&self, path: &str, data: Value) -> StorageResult<u64> {
        let _guard = self.write_lock.lock().await;
        let mut staged = self.inner.snapshot().await;
        let version = staged.get(path).map_or(1, |doc| doc.version + 1);
        staged.insert(path.to_string(), Document { data, version });
        self.persist(&staged).await?;
        self.inner.replace(staged).await;
        Ok(version)
    }

    async fn commit(&self, operations: Vec<BatchOperation>) -> StorageResult<()> {
        // Held until the new state is visible, so commits never interleave.
        let _guard = self.write_lock.lock().await;
        let mut staged = self.inner.snapshot().await;
        InMemoryStore::apply_batch(&mut staged, operations)?;
        self.persist(&staged).await?;
        self.inner.replace(staged).await;
        Ok(())
    }

    async fn persist(&self, documents: &HashMap<String, Document>) -> StorageResult<()> {
        let encoded = serde_json::to_vec_pretty(documents)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Saved {} bytes to {}", encoded.len(), self.path.display());
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    async fn get_document(&self, path: &str) -> StorageResult<Option<Document>> {
        self.inner.get_document(path).await
    }

    async fn run_atomic_batch(&self, operations: Vec<BatchOperation>) -> StorageResult<()> {
        self.commit(operations).await
    }

    async fn update_document(&self, path: &str, fields: Map<String, Value>) -> StorageResult<()> {
        self.commit(vec![BatchOperation::update(path, fields)]).await
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
