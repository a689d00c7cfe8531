use crate::core::DocumentStore;
use crate::domain::ports::{BatchOperation, Document, MutationKind};
use crate::utils::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local document store.
///
/// Batches are applied under one lock after every precondition has been
/// checked, so a batch is either fully visible or not at all.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<Mutex<HashMap<String, Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: HashMap<String, Document>) -> Self {
        Self {
            documents: Arc::new(Mutex::new(documents)),
        }
    }

    /// Writes `data` at `path` unconditionally and returns the new version.
    pub async fn insert(&self, path: &str, data: Value) -> u64 {
        let mut documents = self.documents.lock().await;
        let version = documents.get(path).map_or(1, |doc| doc.version + 1);
        documents.insert(path.to_string(), Document { data, version });
        version
    }

    pub async fn snapshot(&self) -> HashMap<String, Document> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    fn check(documents: &HashMap<String, Document>, op: &BatchOperation) -> StorageResult<()> {
        let existing = documents.get(&op.path);
        match (op.kind, existing) {
            (MutationKind::Create, Some(_)) => {
                return Err(StorageError::AlreadyExists {
                    path: op.path.clone(),
                })
            }
            (MutationKind::Update, None) => {
                return Err(StorageError::MissingDocument {
                    path: op.path.clone(),
                })
            }
            _ => {}
        }
        match (op.expected_version, existing) {
            (Some(_), None) => Err(StorageError::MissingDocument {
                path: op.path.clone(),
            }),
            (Some(expected), Some(doc)) if doc.version != expected => {
                Err(StorageError::VersionConflict {
                    path: op.path.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn apply(documents: &mut HashMap<String, Document>, op: BatchOperation) {
        let next_version = documents.get(&op.path).map_or(1, |doc| doc.version + 1);
        let data = match (op.kind, documents.remove(&op.path)) {
            (MutationKind::Update, Some(Document {
                data: Value::Object(mut fields),
                ..
            })) => {
                fields.extend(op.payload);
                Value::Object(fields)
            }
            _ => Value::Object(op.payload),
        };
        documents.insert(
            op.path,
            Document {
                data,
                version: next_version,
            },
        );
    }

    /// Applies `operations` to `documents`, or leaves them untouched if any
    /// precondition fails.
    pub(crate) fn apply_batch(
        documents: &mut HashMap<String, Document>,
        operations: Vec<BatchOperation>,
    ) -> StorageResult<()> {
        for op in &operations {
            Self::check(documents, op)?;
        }
        for op in operations {
            Self::apply(documents, op);
        }
        Ok(())
    }

    pub(crate) async fn replace(&self, documents: HashMap<String, Document>) {
        *self.documents.lock().await = documents;
    }

    pub(crate) async fn commit(&self, operations: Vec<BatchOperation>) -> StorageResult<()> {
        let mut documents = self.documents.lock().await;
        Self::apply_batch(&mut documents, operations)
    }
}

impl DocumentStore for InMemoryStore {
    async fn get_document(&self, path: &str) -> StorageResult<Option<Document>> {
        Ok(self.documents.lock().await.get(path).cloned())
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_bumps_version() {
        let store = InMemoryStore::new();
        store.insert("docs/a", json!({"x": 1, "y": 2})).await;

        store
            .update_document("docs/a", fields(json!({"y": 3, "z": 4})))
            .await
            .unwrap();

        let doc = store.get_document("docs/a").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"x": 1, "y": 3, "z": 4}));
        assert_eq!(doc.version, 2);
    }

    #[tokio::test]
    async fn test_failed_precondition_applies_nothing() {
        let store = InMemoryStore::new();
        let version = store.insert("docs/a", json!({"n": 0})).await;
        store.insert("docs/a", json!({"n": 1})).await;

        let result = store
            .run_atomic_batch(vec![
                BatchOperation::create("docs/b", fields(json!({"n": 9}))),
                BatchOperation::update("docs/a", fields(json!({"n": 2}))).if_version(version),
            ])
            .await;

        assert!(matches!(result, Err(StorageError::VersionConflict { .. })));
        assert!(store.get_document("docs/b").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_and_update_preconditions() {
        let store = InMemoryStore::new();
        store.insert("docs/a", json!({})).await;

        let dup = store
            .run_atomic_batch(vec![BatchOperation::create("docs/a", Map::new())])
            .await;
        assert!(matches!(dup, Err(StorageError::AlreadyExists { .. })));

        let missing = store.update_document("docs/none", Map::new()).await;
        assert!(matches!(missing, Err(StorageError::MissingDocument { .. })));
    }
}
