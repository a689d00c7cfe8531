use crate::domain::model::NotificationEvent;
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub appointment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReceipt {
    pub appointment_id: String,
    pub released_slots: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalReceipt {
    pub notification: NotificationEvent,
}

/// One bookable start position and the contiguous slots it would occupy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStart {
    pub index: u32,
    pub time: String,
    pub slot_indexes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotListing {
    pub slots: Vec<CandidateStart>,
}

/// The `{success, ...}` rendering of an operation result.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Outcome<T> {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T: Serialize> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Outcome {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Outcome {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}
