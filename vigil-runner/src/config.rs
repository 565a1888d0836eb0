//! Runtime configuration
//!
//! Defines the tunables of the trigger runtime and the poll defaults handed
//! to tasks that do not bring their own.

use std::time::Duration;
use vigil_core::PollConfig;

/// Trigger runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum number of triggers polling at the same time
    pub max_concurrent_triggers: usize,

    /// Wait between status checks when a task does not set one
    pub default_poll_interval: Duration,

    /// Status check bound when a task does not set one
    pub default_max_attempts: Option<u32>,

    /// Capacity of the delivery channel back to the engine
    pub delivery_buffer: usize,
}

impl RuntimeConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            max_concurrent_triggers: 16,
            default_poll_interval: Duration::from_secs(30),
            default_max_attempts: None,
            delivery_buffer: 64,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables, all optional:
    /// - VIGIL_MAX_CONCURRENT_TRIGGERS (default: 16)
    /// - VIGIL_POLL_INTERVAL (seconds, default: 30)
    /// - VIGIL_MAX_ATTEMPTS (default: unbounded)
    /// - VIGIL_DELIVERY_BUFFER (default: 64)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let max_concurrent_triggers = parse_var::<usize>("VIGIL_MAX_CONCURRENT_TRIGGERS")?
            .unwrap_or(defaults.max_concurrent_triggers);

        let default_poll_interval = parse_var::<u64>("VIGIL_POLL_INTERVAL")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.default_poll_interval);

        let default_max_attempts = parse_var::<u32>("VIGIL_MAX_ATTEMPTS")?;

        let delivery_buffer =
            parse_var::<usize>("VIGIL_DELIVERY_BUFFER")?.unwrap_or(defaults.delivery_buffer);

        Ok(Self {
            max_concurrent_triggers,
            default_poll_interval,
            default_max_attempts,
            delivery_buffer,
        })
    }

    /// Poll configuration built from the defaults
    pub fn poll_config(&self) -> PollConfig {
        let config = PollConfig::new(self.default_poll_interval);
        match self.default_max_attempts {
            Some(max_attempts) => config.with_max_attempts(max_attempts),
            None => config,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrent_triggers == 0 {
            anyhow::bail!("max_concurrent_triggers must be greater than 0");
        }

        if self.delivery_buffer == 0 {
            anyhow::bail!("delivery_buffer must be greater than 0");
        }

        if self.default_max_attempts == Some(0) {
            anyhow::bail!("default_max_attempts must be greater than 0");
        }

        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, value)),
        Err(_) => Ok(None),
    }
}
