use crate::core::DocumentStore;
use crate::domain::model::{
    appointment_path, Appointment, AppointmentStatus, NotificationEvent, NotificationKind,
};
use crate::domain::outcome::ApprovalReceipt;
use crate::domain::ports::BatchOperation;
use crate::utils::error::{Result, SchedulingError, StorageError};
use serde_json::{json, Map};
use std::sync::Arc;

/// Reads an appointment together with its version.
pub(crate) async fn load_appointment<S: DocumentStore>(
    store: &S,
    appointment_id: &str,
) -> Result<(Appointment, u64)> {
    if appointment_id.trim().is_empty() {
        return Err(SchedulingError::AppointmentNotFound);
    }
    let path = appointment_path(appointment_id);
    let document = store
        .get_document(&path)
        .await?
        .ok_or(SchedulingError::AppointmentNotFound)?;
    let version = document.version;
    let appointment = document
        .into_typed::<Appointment>()
        .map_err(|e| SchedulingError::malformed(&path, e))?;
    Ok((appointment, version))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject { reason: String },
}

/// Owner-driven `pending -> confirmed | rejected` transitions.
///
/// Preconditions are checked in a fixed order (existence, ownership,
/// status, reason) and the first failure is the one reported.
pub struct ApprovalWorkflow<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> ApprovalWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn approve_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
    ) -> Result<ApprovalReceipt> {
        self.decide(business_id, appointment_id, Decision::Approve)
            .await
    }

    pub async fn reject_appointment(
        &self,
        business_id: &str,
        appointment_id: &str,
        reason: &str,
    ) -> Result<ApprovalReceipt> {
        let decision = Decision::Reject {
            reason: reason.trim().to_string(),
        };
        self.decide(business_id, appointment_id, decision).await
    }

    async fn decide(
        &self,
        business_id: &str,
        appointment_id: &str,
        decision: Decision,
    ) -> Result<ApprovalReceipt> {
        let (appointment, version) = load_appointment(self.store.as_ref(), appointment_id).await?;

        if appointment.business_id != business_id {
            tracing::warn!(
                "Business {} is not the owner of appointment {}",
                business_id,
                appointment_id
            );
            return Err(SchedulingError::Unauthorized);
        }
        if appointment.status != AppointmentStatus::Pending {
            tracing::debug!(
                "Appointment {} is already {}",
                appointment_id,
                appointment.status
            );
            return Err(SchedulingError::NotPending);
        }

        let (status, kind, reason) = match decision {
            Decision::Approve => (
                AppointmentStatus::Confirmed,
                NotificationKind::AppointmentApproved,
                None,
            ),
            Decision::Reject { reason } if reason.is_empty() => {
                return Err(SchedulingError::RejectionReasonRequired)
            }
            Decision::Reject { reason } => (
                AppointmentStatus::Rejected,
                NotificationKind::AppointmentRejected,
                Some(reason),
            ),
        };

        let now = self.store.server_timestamp();
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(status));
        fields.insert("updatedAt".to_string(), json!(now));
        if let Some(reason) = &reason {
            fields.insert("rejectionReason".to_string(), json!(reason));
        }

        // Any other writer of an appointment moves it out of pending, so a
        // version mismatch means the decision was already taken.
        let batch = vec![
            BatchOperation::update(appointment_path(appointment_id), fields).if_version(version),
        ];
        match self.store.run_atomic_batch(batch).await {
            Ok(()) => {}
            Err(StorageError::VersionConflict { .. }) => {
                tracing::debug!(
                    "Appointment {} changed before it could be {}",
                    appointment_id,
                    status
                );
                return Err(SchedulingError::NotPending);
            }
            Err(e) => {
                tracing::warn!("Could not mark {} as {}: {}", appointment_id, status, e);
                return Err(e.into());
            }
        }

        tracing::info!("Appointment {} is now {}", appointment_id, status);

        Ok(ApprovalReceipt {
            notification: NotificationEvent {
                kind,
                customer_id: appointment.customer_id,
                appointment_id: appointment_id.to_string(),
                reason,
                timestamp: now,
            },
        })
    }
}
