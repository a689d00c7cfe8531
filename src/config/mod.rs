#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::SchedulerConfig;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 15;

/// Runtime knobs shared by the scheduling components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub default_slot_granularity_minutes: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            default_slot_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
        }
    }
}
