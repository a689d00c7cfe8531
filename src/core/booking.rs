use crate::core::slot_grid::{load_slot_day, to_fields};
use crate::core::DocumentStore;
use crate::domain::model::{
    appointment_path, slot_day_path, slots_needed, Appointment, AppointmentStatus, ServiceDetails,
};
use crate::domain::outcome::BookingReceipt;
use crate::domain::ports::BatchOperation;
use crate::utils::error::{Result, SchedulingError};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Map};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub business_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub slot_indexes: Vec<u32>,
    pub service_duration_minutes: u32,
    pub service: ServiceDetails,
}

impl BookingRequest {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("business id", &self.business_id),
            ("customer id", &self.customer_id),
            ("service id", &self.service_id),
        ] {
            if value.trim().is_empty() {
                return Err(SchedulingError::invalid_request(format!("{} is required", field)));
            }
        }
        if self.service_duration_minutes == 0 {
            return Err(SchedulingError::invalid_request(
                "service duration must be positive",
            ));
        }
        if self.start_time.date() != self.date {
            return Err(SchedulingError::invalid_request(format!(
                "start time {} is not on {}",
                self.start_time, self.date
            )));
        }
        if self.slot_indexes.is_empty() {
            return Err(SchedulingError::invalid_request("no slots selected"));
        }
        if self.slot_indexes.windows(2).any(|pair| pair[0].checked_add(1) != Some(pair[1])) {
            return Err(SchedulingError::invalid_request(
                "slot indexes must be contiguous and ascending",
            ));
        }
        Ok(())
    }
}

/// Reserves slots and creates the pending appointment in one atomic batch.
pub struct BookingCoordinator<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> BookingCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn book_appointment(&self, request: BookingRequest) -> Result<BookingReceipt> {
        request.validate()?;

        // Fresh per attempt; a failed commit never hands this id out.
        let appointment_id = Uuid::new_v4().to_string();

        let (mut day, day_version) =
            load_slot_day(self.store.as_ref(), &request.business_id, request.date).await?;

        let expected = slots_needed(request.service_duration_minutes, day.granularity_minutes);
        if request.slot_indexes.len() != expected {
            return Err(SchedulingError::invalid_request(format!(
                "a {} minute service needs {} slots of {} minutes, got {}",
                request.service_duration_minutes,
                expected,
                day.granularity_minutes,
                request.slot_indexes.len()
            )));
        }

        let start_label = request.start_time.format("%H:%M").to_string();
        match day.slot(request.slot_indexes[0]) {
            Some(slot) if slot.time == start_label => {}
            Some(slot) => {
                return Err(SchedulingError::invalid_request(format!(
                    "slot {} starts at {}, not {}",
                    slot.index, slot.time, start_label
                )))
            }
            None => {
                return Err(SchedulingError::SlotUnavailable {
                    index: request.slot_indexes[0],
                })
            }
        }

        day.reserve(&request.slot_indexes)?;

        let now = self.store.server_timestamp();
        let appointment = Appointment {
            id: appointment_id.clone(),
            business_id: request.business_id.clone(),
            customer_id: request.customer_id.clone(),
            service_id: request.service_id.clone(),
            date: request.date,
            start_time: request.start_time,
            end_time: request.start_time
                + Duration::minutes(i64::from(request.service_duration_minutes)),
            slot_indexes: request.slot_indexes.clone(),
            status: AppointmentStatus::Pending,
            service_name: request.service.name.clone(),
            service_price: request.service.price,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let appointment_doc = appointment_path(&appointment_id);
        let day_doc = slot_day_path(&request.business_id, request.date);
        let mut slot_fields = Map::new();
        slot_fields.insert("slots".to_string(), json!(day.slots));

        let batch = vec![
            BatchOperation::create(
                appointment_doc.clone(),
                to_fields(&appointment_doc, &appointment)?,
            ),
            BatchOperation::update(day_doc, slot_fields).if_version(day_version),
        ];

        tracing::debug!(
            "Committing booking {} for slots {:?} of {} on {}",
            appointment_id,
            request.slot_indexes,
            request.business_id,
            request.date
        );

        if let Err(e) = self.store.run_atomic_batch(batch).await {
            tracing::warn!("Booking {} was not committed: {}", appointment_id, e);
            return Err(e.into());
        }

        tracing::info!(
            "Booked appointment {} for customer {} at {} {}",
            appointment_id,
            request.customer_id,
            request.date,
            start_label
        );

        Ok(BookingReceipt { appointment_id })
    }
}
