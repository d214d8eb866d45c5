use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{AppError, AppResult};

pub const DEFAULT_TRAVEL_BUFFER_MINUTES: i64 = 90;
pub const DEFAULT_DAILY_CAPACITY_HOURS: f64 = 8.0;

/// Tunable knobs of the availability engine. Deployments override these per
/// municipality agreement; everything else in the engine is fixed policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Minimum idle minutes required between two events in different locations.
    #[serde(default = "default_travel_buffer_minutes")]
    pub travel_buffer_minutes: i64,
    /// Maximum cumulative event hours per trainer per calendar day.
    #[serde(default = "default_daily_capacity_hours")]
    pub daily_capacity_hours: f64,
}

fn default_travel_buffer_minutes() -> i64 {
    DEFAULT_TRAVEL_BUFFER_MINUTES
}

fn default_daily_capacity_hours() -> f64 {
    DEFAULT_DAILY_CAPACITY_HOURS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            travel_buffer_minutes: DEFAULT_TRAVEL_BUFFER_MINUTES,
            daily_capacity_hours: DEFAULT_DAILY_CAPACITY_HOURS,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(
            target: "app::config",
            travel_buffer_minutes = config.travel_buffer_minutes,
            daily_capacity_hours = config.daily_capacity_hours,
            "engine config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.travel_buffer_minutes < 0 {
            return Err(AppError::validation_with_details(
                "travel buffer must not be negative",
                json!({"travelBufferMinutes": self.travel_buffer_minutes}),
            ));
        }
        if self.daily_capacity_hours <= 0.0 || !self.daily_capacity_hours.is_finite() {
            return Err(AppError::validation_with_details(
                "daily capacity must be a positive number of hours",
                json!({"dailyCapacityHours": self.daily_capacity_hours}),
            ));
        }
        Ok(())
    }

    pub fn daily_capacity_minutes(&self) -> i64 {
        (self.daily_capacity_hours * 60.0).round() as i64
    }
}
