use crate::core::DocumentStore;
use crate::domain::model::{slot_day_path, slots_needed, Slot};
use crate::domain::outcome::{CandidateStart, SlotListing};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Bookable start positions for one service duration on one day.
///
/// Candidates are computed on each call to [`AvailableSlots::iter`], so the
/// sequence can be walked any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableSlots {
    slots: Vec<Slot>,
    slots_needed: usize,
}

impl AvailableSlots {
    pub fn empty() -> Self {
        Self::default()
    }

    // Callers must reject grids with repeated indexes first.
    fn new(mut slots: Vec<Slot>, slots_needed: usize) -> Self {
        slots.sort_by_key(|slot| slot.index);
        Self {
            slots,
            slots_needed,
        }
    }

    pub fn slots_needed(&self) -> usize {
        self.slots_needed
    }

    pub fn iter(&self) -> impl Iterator<Item = CandidateStart> + '_ {
        let needed = self.slots_needed;
        self.slots
            .windows(needed.max(1))
            .filter(move |window| needed > 0 && Self::is_free_run(window))
            .map(|window| CandidateStart {
                index: window[0].index,
                time: window[0].time.clone(),
                slot_indexes: window.iter().map(|slot| slot.index).collect(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_listing(&self) -> SlotListing {
        SlotListing {
            slots: self.iter().collect(),
        }
    }

    // Window is sorted by index, so contiguity reduces to the span check.
    fn is_free_run(window: &[Slot]) -> bool {
        let first = window[0].index as usize;
        let last = window[window.len() - 1].index as usize;
        last - first + 1 == window.len() && window.iter().all(|slot| slot.available)
    }
}

pub struct AvailabilityCalculator<S: DocumentStore> {
    store: Arc<S>,
    default_granularity_minutes: u32,
}

impl<S: DocumentStore> AvailabilityCalculator<S> {
    pub fn new(store: Arc<S>, default_granularity_minutes: u32) -> Self {
        Self {
            store,
            default_granularity_minutes,
        }
    }

    /// Never fails: a missing business id, a missing grid, unreadable
    /// storage and malformed slot data all read as "no availability".
    pub async fn find_available_slots(
        &self,
        business_id: &str,
        date: NaiveDate,
        service_duration_minutes: u32,
    ) -> AvailableSlots {
        if business_id.trim().is_empty() {
            return AvailableSlots::empty();
        }

        let path = slot_day_path(business_id, date);
        let document = match self.store.get_document(&path).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::debug!("No slot grid at {}", path);
                return AvailableSlots::empty();
            }
            Err(e) => {
                tracing::warn!("Failed to read slot grid {}: {}", path, e);
                return AvailableSlots::empty();
            }
        };

        let slots = match document.data.get("slots") {
            Some(raw) if raw.is_array() => match serde_json::from_value::<Vec<Slot>>(raw.clone()) {
                Ok(slots) => slots,
                Err(e) => {
                    tracing::warn!("Malformed slot entries in {}: {}", path, e);
                    return AvailableSlots::empty();
                }
            },
            _ => {
                tracing::warn!("Slot grid {} has no slot sequence", path);
                return AvailableSlots::empty();
            }
        };

        let mut seen = HashSet::with_capacity(slots.len());
        if let Some(slot) = slots.iter().find(|slot| !seen.insert(slot.index)) {
            tracing::warn!("Slot grid {} repeats index {}", path, slot.index);
            return AvailableSlots::empty();
        }

        let granularity = document
            .data
            .get("granularityMinutes")
            .and_then(Value::as_u64)
            .and_then(|g| u32::try_from(g).ok())
            .filter(|&g| g > 0)
            .unwrap_or(self.default_granularity_minutes);

        AvailableSlots::new(slots, slots_needed(service_duration_minutes, granularity))
    }
}
