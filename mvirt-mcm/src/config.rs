//! Driver configuration.

use std::time::Duration;

use thiserror::Error;

/// Provider name this driver registers under.
pub const DEFAULT_PROVIDER_NAME: &str = "mvirt";

/// Interval between deletion confirmation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound for deletion confirmation.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Longest accepted delete timeout.
pub const MAX_DELETE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum ratio between delete timeout and poll interval.
const MIN_POLLS_PER_TIMEOUT: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("namespace is required")]
    NamespaceRequired,

    #[error("provider name is required")]
    ProviderNameRequired,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("delete timeout {timeout:?} must be at least 10x the poll interval {interval:?}")]
    TimeoutTooShort {
        timeout: Duration,
        interval: Duration,
    },

    #[error("delete timeout {timeout:?} exceeds the maximum of {max:?}")]
    TimeoutTooLong { timeout: Duration, max: Duration },
}

/// Configuration handed to the driver at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Namespace all machine and secret objects live in.
    pub namespace: String,
    /// Provider name requests must carry.
    pub provider_name: String,
    pub poll_interval: Duration,
    pub delete_timeout: Duration,
}

impl DriverConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }

    pub fn with_provider_name(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = provider_name.into();
        self
    }

    pub fn with_polling(mut self, poll_interval: Duration, delete_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.delete_timeout = delete_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::NamespaceRequired);
        }
        if self.provider_name.trim().is_empty() {
            return Err(ConfigError::ProviderNameRequired);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.delete_timeout > MAX_DELETE_TIMEOUT {
            return Err(ConfigError::TimeoutTooLong {
                timeout: self.delete_timeout,
                max: MAX_DELETE_TIMEOUT,
            });
        }
        // An interval too large to multiply can never fit ten times into the timeout.
        let too_short = self
            .poll_interval
            .checked_mul(MIN_POLLS_PER_TIMEOUT)
            .is_none_or(|min| self.delete_timeout < min);
        if too_short {
            return Err(ConfigError::TimeoutTooShort {
                timeout: self.delete_timeout,
                interval: self.poll_interval,
            });
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new("default")
    }
}
