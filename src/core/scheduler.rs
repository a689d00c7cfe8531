use crate::config::SchedulerSettings;
use crate::core::approval::{load_appointment, ApprovalWorkflow};
use crate::core::availability::{AvailabilityCalculator, AvailableSlots};
use crate::core::booking::{BookingCoordinator, BookingRequest};
use crate::core::cancellation::CancellationCoordinator;
use crate::core::slot_grid::SlotGridPublisher;
use crate::core::{DocumentStore, NotificationSink};
use crate::domain::model::{Appointment, Business, SlotDay};
use crate::domain::outcome::{ApprovalReceipt, BookingReceipt, CancellationReceipt};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Single entry point over one store: every scheduling operation, plus
/// hand-off of notification events to the configured sink.
pub struct Scheduler<S: DocumentStore, N: NotificationSink> {
    store: Arc<S>,
    notifier: N,
    publisher: SlotGridPublisher<S>,
    availability: AvailabilityCalculator<S>,
    booking: BookingCoordinator<S>,
    cancellation: CancellationCoordinator<S>,
    approval: ApprovalWorkflow<S>,
}

impl<S: DocumentStore, N: NotificationSink> Scheduler<S, N> {
    pub fn new(store: Arc<S>, notifier: N, settings: SchedulerSettings) -> Self {
        Self {
            publisher: SlotGridPublisher::new(store.clone()),
            availability: AvailabilityCalculator::new(
                store.clone(),
                settings.default_slot_granularity_minutes,
            ),
            booking: BookingCoordinator::new(store.clone()),
            cancellation: CancellationCoordinator::new(store.clone()),
            approval: ApprovalWorkflow::new(store.clone()),
            store,
            notifier,
        }
    }

    pub async fn open_day(&self, business: &Business, date: NaiveDate) -> Result<SlotDay> {
        self.publisher.open_day(business, date).await
    }

    pub async fn find_available_slots(
        &self,
        business_id: &str,
        date: NaiveDate,
        service_duration_minutes: u32,
    ) -> AvailableSlots {
        self.availability
            .find_available_slots(business_id, date, service_duration_minutes)
            .await
    }

    pub async fn book_appointment(&self, request: BookingRequest) -> Result<BookingReceipt> {
        self.booking.book_appointment(request).await
    }

    pub async fn cancel_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
        date: NaiveDate,
    ) -> Result<CancellationReceipt> {
        self.cancellation
            .cancel_appointment(business_id, appointment_id, date)
            .await
    }

    pub async fn approve_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
    ) -> Result<ApprovalReceipt> {
        let receipt = self
            .approval
            .approve_appointment(business_id, appointment_id)
            .await?;
        self.dispatch(&receipt).await;
        Ok(receipt)
    }

    pub async fn reject_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
        reason: &str,
    ) -> Result<ApprovalReceipt> {
        let receipt = self
            .approval
            .reject_appointment(business_id, appointment_id, reason)
            .await?;
        self.dispatch(&receipt).await;
        Ok(receipt)
    }

    pub async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment> {
        let (appointment, _) = load_appointment(self.store.as_ref(), appointment_id).await?;
        Ok(appointment)
    }

    // The transition is already committed; delivery problems are only logged.
    async fn dispatch(&self, receipt: &ApprovalReceipt) {
        if let Err(e) = self.notifier.deliver(receipt.notification.clone()).await {
            tracing::warn!(
                "Failed to deliver {:?} for appointment {}: {}",
                receipt.notification.kind,
                receipt.notification.appointment_id,
                e
            );
        }
    }
}
