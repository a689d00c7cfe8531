use crate::core::DocumentStore;
use crate::domain::model::{slot_day_path, Business, SlotDay};
use crate::domain::ports::BatchOperation;
use crate::utils::error::{Result, SchedulingError, StorageError};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Serializes `value` into the top-level field map of a document.
pub(crate) fn to_fields<T: Serialize>(path: &str, value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(|e| SchedulingError::malformed(path, e))? {
        Value::Object(fields) => Ok(fields),
        other => Err(SchedulingError::malformed(
            path,
            format!("expected an object, got {}", other),
        )),
    }
}

/// Reads the slot grid for (business, date) together with its version.
pub(crate) async fn load_slot_day<S: DocumentStore>(
    store: &S,
    business_id: &str,
    date: NaiveDate,
) -> Result<(SlotDay, u64)> {
    let path = slot_day_path(business_id, date);
    let document = store
        .get_document(&path)
        .await?
        .ok_or_else(|| SchedulingError::SlotDayNotFound {
            business_id: business_id.to_string(),
            date: date.to_string(),
        })?;
    let version = document.version;
    let day = document
        .into_typed::<SlotDay>()
        .map_err(|e| SchedulingError::malformed(&path, e))?;
    Ok((day, version))
}

/// Publishes slot grids lazily, one per business per date.
pub struct SlotGridPublisher<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> SlotGridPublisher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the grid for `date`, creating it from the business's opening
    /// hours if none has been published yet. An existing grid is never
    /// overwritten.
    pub async fn open_day(&self, business: &Business, date: NaiveDate) -> Result<SlotDay> {
        if business.id.trim().is_empty() {
            return Err(SchedulingError::invalid_request("business id is required"));
        }

        match load_slot_day(self.store.as_ref(), &business.id, date).await {
            Ok((day, _)) => {
                tracing::debug!("Slot grid for {} on {} already published", business.id, date);
                return Ok(day);
            }
            Err(SchedulingError::SlotDayNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let day = SlotDay::from_opening_hours(business, date);
        let path = slot_day_path(&business.id, date);
        let fields = to_fields(&path, &day)?;

        match self
            .store
            .run_atomic_batch(vec![BatchOperation::create(path, fields)])
            .await
        {
            Ok(()) => {
                tracing::info!(
                    "Published {} slots for {} on {}",
                    day.slots.len(),
                    business.id,
                    date
                );
                Ok(day)
            }
            // Lost a race with another publisher; theirs wins.
            Err(StorageError::AlreadyExists { .. }) => {
                let (day, _) = load_slot_day(self.store.as_ref(), &business.id, date).await?;
                Ok(day)
            }
            Err(e) => Err(e.into()),
        }
    }
}
