pub mod approval;
pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod scheduler;
pub mod slot_grid;

pub use crate::domain::model::{Appointment, AppointmentStatus, NotificationEvent, SlotDay};
pub use crate::domain::ports::{DocumentStore, NotificationSink};
pub use crate::utils::error::Result;
