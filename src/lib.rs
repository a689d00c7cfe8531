pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};
pub use config::{SchedulerConfig, SchedulerSettings};

pub use adapters::{ChannelNotifier, InMemoryStore, JsonFileStore, TracingNotifier};
pub use core::{availability::AvailableSlots, booking::BookingRequest, scheduler::Scheduler};
pub use domain::model::{
    Appointment, AppointmentStatus, Business, NotificationEvent, NotificationKind, ServiceDetails,
    Slot, SlotDay,
};
pub use domain::outcome::Outcome;
pub use domain::ports::{BatchOperation, Document, DocumentStore, MutationKind, NotificationSink};
pub use utils::error::{Result, SchedulingError, StorageError};
