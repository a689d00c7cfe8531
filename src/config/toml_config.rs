use crate::config::{SchedulerSettings, DEFAULT_SLOT_GRANULARITY_MINUTES};
use crate::domain::model::Business;
use crate::utils::error::{Result, SchedulingError};
use crate::utils::validation::{
    validate_non_empty_string, validate_opening_hours, validate_path, validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub businesses: Vec<Business>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_granularity")]
    pub default_slot_granularity_minutes: u32,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_granularity() -> u32 {
    DEFAULT_SLOT_GRANULARITY_MINUTES
}

fn default_data_file() -> String {
    "./data/scheduler.json".to_string()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            default_slot_granularity_minutes: default_granularity(),
            data_file: default_data_file(),
            json_logs: false,
        }
    }
}

impl SchedulerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the value of the environment variable. Unset
    /// variables are left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SchedulingError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            default_slot_granularity_minutes: self.scheduler.default_slot_granularity_minutes,
        }
    }

    pub fn business(&self, id: &str) -> Option<&Business> {
        self.businesses.iter().find(|b| b.id == id)
    }
}

impl Validate for SchedulerConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "scheduler.default_slot_granularity_minutes",
            self.scheduler.default_slot_granularity_minutes,
            1,
            24 * 60,
        )?;
        validate_path("scheduler.data_file", &self.scheduler.data_file)?;

        let mut seen = HashSet::new();
        for business in &self.businesses {
            validate_non_empty_string("businesses.id", &business.id)?;
            if !seen.insert(business.id.as_str()) {
                return Err(SchedulingError::InvalidConfigValueError {
                    field: "businesses.id".to_string(),
                    value: business.id.clone(),
                    reason: "Duplicate business id".to_string(),
                });
            }
            validate_range(
                &format!("businesses.{}.slot_granularity_minutes", business.id),
                business.slot_granularity_minutes,
                1,
                24 * 60,
            )?;
            for (weekday, hours) in business.hours.iter() {
                validate_opening_hours(
                    &format!("businesses.{}.hours.{}", business.id, weekday),
                    hours,
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[scheduler]
default_slot_granularity_minutes = 20
data_file = "/tmp/scheduler.json"

[[businesses]]
id = "barber-1"
name = "Corner Barber"
slot_granularity_minutes = 30

[businesses.hours]
monday = { open = "09:00", close = "17:00" }
saturday = { open = "10:00", close = "14:00" }
"#;

    #[test]
    fn test_parse_scheduler_config() {
        let config = SchedulerConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.settings().default_slot_granularity_minutes, 20);

        let barber = config.business("barber-1").unwrap();
        assert_eq!(barber.slot_granularity_minutes, 30);
        let monday = barber.hours.for_weekday(Weekday::Mon).unwrap();
        assert_eq!(monday.open, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(barber.hours.for_weekday(Weekday::Sun).is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = SchedulerConfig::from_toml_str("").unwrap();
        assert_eq!(config.scheduler.default_slot_granularity_minutes, 15);
        assert!(config.businesses.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SLOT_SCHEDULER_TEST_DATA", "/var/lib/slots.json");
        let config = SchedulerConfig::from_toml_str(
            "[scheduler]\ndata_file = \"${SLOT_SCHEDULER_TEST_DATA}\"\n",
        )
        .unwrap();
        assert_eq!(config.scheduler.data_file, "/var/lib/slots.json");
    }

    #[test]
    fn test_rejects_inverted_hours_and_duplicates() {
        let inverted = SAMPLE.replace(
            r#"monday = { open = "09:00", close = "17:00" }"#,
            r#"monday = { open = "17:00", close = "09:00" }"#,
        );
        let config = SchedulerConfig::from_toml_str(&inverted).unwrap();
        assert!(config.validate().is_err());

        let mut config = SchedulerConfig::from_toml_str(SAMPLE).unwrap();
        config.businesses.push(config.businesses[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = SchedulerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.businesses.len(), 1);
    }
}
