use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Timer settings for the periodic sync job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// Minutes between the start of two consecutive runs.
    #[serde(default)]
    pub interval_minutes: u64,
    /// Whether a run is triggered immediately at startup instead of after the first interval.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl ScheduleConfig {
    /// Returns the configured interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_minutes == 0 {
            return Err(ValidationError::missing("schedule.interval_minutes"));
        }

        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 0,
            run_on_start: default_run_on_start(),
        }
    }
}

fn default_run_on_start() -> bool {
    true
}
