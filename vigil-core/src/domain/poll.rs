//! Polling configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TaskError};

/// How a job's status is checked
///
/// Fixed when the task is defined. `max_attempts` and `timeout` bound the
/// wait; with neither set, polling continues until the job is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait between two status checks
    pub interval: Duration,

    /// Maximum number of status checks
    pub max_attempts: Option<u32>,

    /// Maximum wall-clock time spent waiting
    pub timeout: Option<Duration>,

    /// Hand polling to the trigger runtime instead of blocking
    pub deferrable: bool,
}

impl PollConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
            deferrable: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = deferrable;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(TaskError::invalid_config(
                "max_attempts must be greater than 0",
            ));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(TaskError::invalid_config("timeout must be greater than 0"));
        }

        self.deadline_from(Utc::now())?;

        Ok(())
    }

    /// Absolute end of the wait for polling that begins at `start`
    ///
    /// `None` when no timeout is set. A timeout that cannot be represented as
    /// a date past `start` is an `InvalidConfig`.
    pub fn deadline_from(&self, start: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let Some(timeout) = self.timeout else {
            return Ok(None);
        };

        chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| start.checked_add_signed(timeout))
            .map(Some)
            .ok_or_else(|| {
                TaskError::invalid_config(format!("timeout {:?} is out of range", timeout))
            })
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
