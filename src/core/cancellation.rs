use crate::core::approval::load_appointment;
use crate::core::slot_grid::load_slot_day;
use crate::core::DocumentStore;
use crate::domain::model::{appointment_path, slot_day_path, AppointmentStatus};
use crate::domain::outcome::CancellationReceipt;
use crate::domain::ports::BatchOperation;
use crate::utils::error::{Result, SchedulingError};
use chrono::NaiveDate;
use serde_json::{json, Map};
use std::sync::Arc;

/// Cancels appointments and hands their slots back to the grid atomically.
pub struct CancellationCoordinator<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> CancellationCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn cancel_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
        date: NaiveDate,
    ) -> Result<CancellationReceipt> {
        let (appointment, appointment_version) =
            load_appointment(self.store.as_ref(), appointment_id).await?;

        if appointment.business_id != business_id {
            tracing::warn!(
                "Business {} tried to cancel appointment {} owned by {}",
                business_id,
                appointment_id,
                appointment.business_id
            );
            return Err(SchedulingError::Unauthorized);
        }
        if !appointment.status.can_transition_to(AppointmentStatus::Cancelled) {
            return Err(SchedulingError::NotCancellable);
        }
        if appointment.date != date {
            return Err(SchedulingError::invalid_request(format!(
                "appointment {} is booked on {}, not {}",
                appointment_id, appointment.date, date
            )));
        }

        let (mut day, day_version) = load_slot_day(self.store.as_ref(), business_id, date).await?;
        day.release(&appointment.slot_indexes);

        let now = self.store.server_timestamp();
        let mut appointment_fields = Map::new();
        appointment_fields.insert("status".to_string(), json!(AppointmentStatus::Cancelled));
        appointment_fields.insert("updatedAt".to_string(), json!(now));

        let mut slot_fields = Map::new();
        slot_fields.insert("slots".to_string(), json!(day.slots));

        let batch = vec![
            BatchOperation::update(appointment_path(appointment_id), appointment_fields)
                .if_version(appointment_version),
            BatchOperation::update(slot_day_path(business_id, date), slot_fields)
                .if_version(day_version),
        ];

        if let Err(e) = self.store.run_atomic_batch(batch).await {
            tracing::warn!("Cancellation of {} was not committed: {}", appointment_id, e);
            return Err(e.into());
        }

        tracing::info!(
            "Cancelled appointment {} and released slots {:?}",
            appointment_id,
            appointment.slot_indexes
        );

        Ok(CancellationReceipt {
            appointment_id: appointment_id.to_string(),
            released_slots: appointment.slot_indexes,
        })
    }
}
