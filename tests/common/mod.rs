#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use slot_scheduler::{
    BatchOperation, BookingRequest, Document, DocumentStore, InMemoryStore, ServiceDetails,
    StorageError,
};
use std::sync::Mutex;

pub const BUSINESS_ID: &str = "test-business-id";
pub const CUSTOMER_ID: &str = "test-user-id";
pub const SERVICE_ID: &str = "test-service-id";

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 21).unwrap()
}

pub fn slot_day_path(business_id: &str) -> String {
    format!("businesses/{}/slots/2025-01-21", business_id)
}

/// Wraps an `InMemoryStore`, records every batch and can be told to reject
/// the next batch with a fixed message.
#[derive(Default)]
pub struct ScriptedStore {
    inner: InMemoryStore,
    batches: Mutex<Vec<Vec<BatchOperation>>>,
    fail_next_batch: Mutex<Option<String>>,
    yield_after_read: bool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields after every read so concurrent callers interleave between
    /// their read and their commit.
    pub fn interleaving() -> Self {
        Self {
            yield_after_read: true,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn fail_next_batch(&self, message: &str) {
        *self.fail_next_batch.lock().unwrap() = Some(message.to_string());
    }

    pub fn batches(&self) -> Vec<Vec<BatchOperation>> {
        self.batches.lock().unwrap().clone()
    }

    /// Publishes a grid of 15 minute slots starting at 09:00.
    pub async fn seed_slot_day(&self, business_id: &str, free: &[bool]) {
        let slots: Vec<Value> = free
            .iter()
            .enumerate()
            .map(|(i, available)| {
                let minutes = 9 * 60 + i * 15;
                json!({
                    "index": i,
                    "time": format!("{:02}:{:02}", minutes / 60, minutes % 60),
                    "available": available,
                })
            })
            .collect();
        self.inner
            .insert(
                &slot_day_path(business_id),
                json!({
                    "businessId": business_id,
                    "date": "2025-01-21",
                    "granularityMinutes": 15,
                    "slots": slots,
                }),
            )
            .await;
    }

    pub async fn slot_flags(&self, business_id: &str) -> Vec<bool> {
        let doc = self
            .inner
            .get_document(&slot_day_path(business_id))
            .await
            .unwrap()
            .unwrap();
        doc.data["slots"]
            .as_array()
            .unwrap()
            .iter()
            .map(|slot| slot["available"].as_bool().unwrap())
            .collect()
    }

    pub async fn appointment_paths(&self) -> Vec<String> {
        self.inner
            .snapshot()
            .await
            .into_keys()
            .filter(|path| path.starts_with("appointments/"))
            .collect()
    }
}

impl DocumentStore for ScriptedStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, StorageError> {
        let document = self.inner.get_document(path).await;
        if self.yield_after_read {
            tokio::task::yield_now().await;
        }
        document
    }

    async fn run_atomic_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StorageError> {
        self.batches.lock().unwrap().push(operations.clone());
        let failure = self.fail_next_batch.lock().unwrap().take();
        if let Some(message) = failure {
            return Err(StorageError::Rejected { message });
        }
        self.inner.run_atomic_batch(operations).await
    }

    async fn update_document(
        &self,
        path: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StorageError> {
        self.inner.update_document(path, fields).await
    }

    fn server_timestamp(&self) -> DateTime<Utc> {
        self.inner.server_timestamp()
    }
}

pub fn booking_request(slot_indexes: Vec<u32>, hour: u32, minute: u32) -> BookingRequest {
    BookingRequest {
        business_id: BUSINESS_ID.to_string(),
        customer_id: CUSTOMER_ID.to_string(),
        service_id: SERVICE_ID.to_string(),
        date: test_date(),
        start_time: test_date().and_hms_opt(hour, minute, 0).unwrap(),
        slot_indexes,
        service_duration_minutes: 30,
        service: ServiceDetails {
            name: "Test Service".to_string(),
            price: 100.0,
        },
    }
}
