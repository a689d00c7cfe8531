use thiserror::Error;

/// Failures raised by a `DocumentStore` implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Document {path} was modified concurrently")]
    VersionConflict { path: String },

    #[error("Document {path} does not exist")]
    MissingDocument { path: String },

    #[error("Document {path} already exists")]
    AlreadyExists { path: String },

    #[error("{message}")]
    Rejected { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Every failure a scheduling operation can report.
///
/// The `Display` output of the precondition variants is matched verbatim by
/// callers, so those messages must not change.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("No slots published for business {business_id} on {date}")]
    SlotDayNotFound { business_id: String, date: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Appointment is not in pending status")]
    NotPending,

    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    #[error("Appointment cannot be cancelled")]
    NotCancellable,

    #[error("Slot {index} is no longer available")]
    SlotUnavailable { index: u32 },

    #[error(transparent)]
    StorageCommit(#[from] StorageError),

    #[error("Malformed document data at {path}: {message}")]
    MalformedData { path: String, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// Coarse error taxonomy used for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Unauthorized,
    InvalidState,
    StorageCommit,
    MalformedData,
    InvalidRequest,
    Configuration,
}

impl SchedulingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SchedulingError::AppointmentNotFound | SchedulingError::SlotDayNotFound { .. } => {
                ErrorCategory::NotFound
            }
            SchedulingError::Unauthorized => ErrorCategory::Unauthorized,
            SchedulingError::NotPending
            | SchedulingError::RejectionReasonRequired
            | SchedulingError::NotCancellable
            | SchedulingError::SlotUnavailable { .. } => ErrorCategory::InvalidState,
            SchedulingError::StorageCommit(_) => ErrorCategory::StorageCommit,
            SchedulingError::MalformedData { .. } => ErrorCategory::MalformedData,
            SchedulingError::InvalidRequest { .. } => ErrorCategory::InvalidRequest,
            SchedulingError::ConfigError { .. }
            | SchedulingError::IoError(_)
            | SchedulingError::ConfigParseError(_)
            | SchedulingError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SchedulingError::StorageCommit(StorageError::VersionConflict { .. })
                | SchedulingError::SlotUnavailable { .. }
        )
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        SchedulingError::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(path: &str, err: impl std::fmt::Display) -> Self {
        SchedulingError::MalformedData {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_messages() {
        assert_eq!(
            SchedulingError::AppointmentNotFound.to_string(),
            "Appointment not found"
        );
        assert_eq!(SchedulingError::Unauthorized.to_string(), "Unauthorized access");
        assert_eq!(
            SchedulingError::NotPending.to_string(),
            "Appointment is not in pending status"
        );
        assert_eq!(
            SchedulingError::RejectionReasonRequired.to_string(),
            "Rejection reason is required"
        );
    }

    #[test]
    fn test_storage_message_passes_through() {
        let err = SchedulingError::from(StorageError::Rejected {
            message: "Booking failed".to_string(),
        });
        assert_eq!(err.to_string(), "Booking failed");
        assert_eq!(err.category(), ErrorCategory::StorageCommit);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err = SchedulingError::from(StorageError::VersionConflict {
            path: "businesses/b/slots/2025-01-21".to_string(),
        });
        assert!(err.is_retryable());
        assert_eq!(SchedulingError::NotPending.category(), ErrorCategory::InvalidState);
    }
}
