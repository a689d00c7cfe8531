use crate::domain::model::NotificationEvent;
use crate::utils::error::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored JSON document together with its write version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub data: Value,
    pub version: u64,
}

impl Document {
    pub fn into_typed<T: serde::de::DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Write a document that must not exist yet.
    Create,
    /// Overwrite the whole document.
    Set,
    /// Merge top-level fields into an existing document.
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperation {
    pub path: String,
    pub kind: MutationKind,
    pub payload: Map<String, Value>,
    /// When set, the commit fails unless the stored version still matches.
    pub expected_version: Option<u64>,
}

impl BatchOperation {
    pub fn create(path: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            kind: MutationKind::Create,
            payload,
            expected_version: None,
        }
    }

    pub fn update(path: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            kind: MutationKind::Update,
            payload,
            expected_version: None,
        }
    }

    pub fn if_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Key-addressed document storage with all-or-nothing batch commits.
///
/// `run_atomic_batch` must reject the whole batch when any operation's
/// precondition fails, including an `expected_version` that no longer
/// matches. That compare-and-swap is what prevents double booking.
pub trait DocumentStore: Send + Sync {
    fn get_document(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = StorageResult<Option<Document>>> + Send;

    fn run_atomic_batch(
        &self,
        operations: Vec<BatchOperation>,
    ) -> impl std::future::Future<Output = StorageResult<()>> + Send;

    fn update_document(
        &self,
        path: &str,
        fields: Map<String, Value>,
    ) -> impl std::future::Future<Output = StorageResult<()>> + Send;

    fn server_timestamp(&self) -> DateTime<Utc>;
}

/// Receives notification events for delivery to customers.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: NotificationEvent) -> anyhow::Result<()>;
}
