use crate::utils::error::{Result, SchedulingError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub const APPOINTMENTS_COLLECTION: &str = "appointments";
pub const BUSINESSES_COLLECTION: &str = "businesses";

pub fn appointment_path(appointment_id: &str) -> String {
    format!("{}/{}", APPOINTMENTS_COLLECTION, appointment_id)
}

pub fn slot_day_path(business_id: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/slots/{}",
        BUSINESSES_COLLECTION,
        business_id,
        date.format("%Y-%m-%d")
    )
}

/// Number of grid slots a service of `duration_minutes` occupies.
pub fn slots_needed(duration_minutes: u32, granularity_minutes: u32) -> usize {
    if granularity_minutes == 0 {
        return 0;
    }
    duration_minutes.div_ceil(granularity_minutes) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub monday: Option<OpeningHours>,
    pub tuesday: Option<OpeningHours>,
    pub wednesday: Option<OpeningHours>,
    pub thursday: Option<OpeningHours>,
    pub friday: Option<OpeningHours>,
    pub saturday: Option<OpeningHours>,
    pub sunday: Option<OpeningHours>,
}

impl WeeklyHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&OpeningHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &OpeningHours)> {
        [
            (Weekday::Mon, &self.monday),
            (Weekday::Tue, &self.tuesday),
            (Weekday::Wed, &self.wednesday),
            (Weekday::Thu, &self.thursday),
            (Weekday::Fri, &self.friday),
            (Weekday::Sat, &self.saturday),
            (Weekday::Sun, &self.sunday),
        ]
        .into_iter()
        .filter_map(|(day, hours)| hours.as_ref().map(|h| (day, h)))
    }
}

/// A service business. Owned outside this crate and only read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "slot_granularity_minutes")]
    pub slot_granularity_minutes: u32,
    #[serde(default)]
    pub hours: WeeklyHours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub index: u32,
    pub time: String,
    pub available: bool,
}

/// The ordered slot grid of one business on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDay {
    pub business_id: String,
    pub date: NaiveDate,
    pub granularity_minutes: u32,
    pub slots: Vec<Slot>,
}

impl SlotDay {
    /// Builds the grid for `date` from the business's opening hours. Every
    /// slot must fit entirely before closing time.
    pub fn from_opening_hours(business: &Business, date: NaiveDate) -> Self {
        let granularity = business.slot_granularity_minutes;
        let mut slots = Vec::new();

        if let Some(hours) = business.hours.for_weekday(date.weekday()) {
            if granularity > 0 {
                let open = hours.open.num_seconds_from_midnight() / 60;
                let close = hours.close.num_seconds_from_midnight() / 60;
                let mut minute = open;
                while minute + granularity <= close {
                    slots.push(Slot {
                        index: slots.len() as u32,
                        time: format!("{:02}:{:02}", minute / 60, minute % 60),
                        available: true,
                    });
                    minute += granularity;
                }
            }
        }

        Self {
            business_id: business.id.clone(),
            date,
            granularity_minutes: granularity,
            slots,
        }
    }

    pub fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.index == index)
    }

    /// Marks every slot in `indexes` unavailable. Fails without modifying
    /// the grid if any index is missing or already held.
    pub fn reserve(&mut self, indexes: &[u32]) -> Result<()> {
        if let Some(&index) = indexes
            .iter()
            .find(|&&index| !self.slot(index).is_some_and(|slot| slot.available))
        {
            return Err(SchedulingError::SlotUnavailable { index });
        }
        self.set_available(indexes, false);
        Ok(())
    }

    /// Makes the given slots available again. Unknown indexes are ignored.
    pub fn release(&mut self, indexes: &[u32]) {
        self.set_available(indexes, true);
    }

    fn set_available(&mut self, indexes: &[u32], available: bool) {
        for slot in self.slots.iter_mut() {
            if indexes.contains(&slot.index) {
                slot.available = available;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub business_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub slot_indexes: Vec<u32>,
    pub status: AppointmentStatus,
    pub service_name: String,
    pub service_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    AppointmentApproved,
    AppointmentRejected,
}

/// A customer-visible status change, handed to a delivery collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub customer_id: String,
    pub appointment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}
