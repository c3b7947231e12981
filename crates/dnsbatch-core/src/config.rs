//! Configuration types for dnsbatch
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Comment attached to every change batch unless overridden
pub const DEFAULT_BATCH_COMMENT: &str = "Upserting all device aliases";

/// TTL applied to every generated record unless overridden
pub const DEFAULT_RECORD_TTL: u32 = 300;

/// Main dnsbatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsBatchConfig {
    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Change batch settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Submission and sync polling settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl DnsBatchConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.batch.validate()?;
        self.sync.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// AWS Route 53
    ///
    /// Credentials are never part of this configuration; they come from the
    /// AWS default credential chain.
    Route53 {
        /// Region override (optional, otherwise taken from the environment)
        region: Option<String>,
        /// Named profile override (optional)
        profile: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 { region, profile } => {
                if region.as_deref().is_some_and(str::is_empty) {
                    return Err(crate::Error::config("Route 53 region cannot be empty"));
                }
                if profile.as_deref().is_some_and(str::is_empty) {
                    return Err(crate::Error::config("Route 53 profile cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Route53 {
            region: None,
            profile: None,
        }
    }
}

/// Change batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Comment carried by the submitted batch
    #[serde(default = "default_comment")]
    pub comment: String,

    /// TTL for every generated A record (in seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl BatchConfig {
    /// Validate the batch settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            comment: default_comment(),
            ttl: default_ttl(),
        }
    }
}

/// Submission and sync polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay between two change status queries (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wall-clock ceiling for waiting on INSYNC (in seconds)
    ///
    /// Reaching it is reported as a timeout, never as an error.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Consecutive failed status queries tolerated before polling aborts
    ///
    /// Set to 0 to abort on the first failure.
    #[serde(default = "default_max_consecutive_poll_errors")]
    pub max_consecutive_poll_errors: usize,

    /// Skip sync polling entirely after a successful submission
    #[serde(default)]
    pub skip_sync_check: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the sync settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.poll_timeout_secs < self.poll_interval_secs {
            return Err(crate::Error::config(format!(
                "Poll timeout ({}s) must not be shorter than the poll interval ({}s)",
                self.poll_timeout_secs, self.poll_interval_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Delay between two status queries
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Number of status queries that fit in the timeout
    pub fn max_polls(&self) -> u64 {
        self.poll_timeout_secs
            .div_ceil(self.poll_interval_secs.max(1))
            .max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_consecutive_poll_errors: default_max_consecutive_poll_errors(),
            skip_sync_check: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_comment() -> String {
    DEFAULT_BATCH_COMMENT.to_string()
}

fn default_ttl() -> u32 {
    DEFAULT_RECORD_TTL
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_max_consecutive_poll_errors() -> usize {
    3
}

fn default_event_channel_capacity() -> usize {
    256
}
