//! Redis configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration
///
/// Inbound drift triggers (and optionally observations) are read from
/// streams through a consumer group; outbound events are appended to
/// `assigned_stream` or `events_stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Stream carrying inbound drift triggers
    #[serde(default = "default_drift_stream")]
    pub drift_stream: String,

    /// Stream receiving `profile.assigned.v1`
    #[serde(default = "default_assigned_stream")]
    pub assigned_stream: String,

    /// Stream receiving every other outbound event
    #[serde(default = "default_events_stream")]
    pub events_stream: String,

    /// Inbound observation feed; not consumed when unset
    #[serde(default)]
    pub observation_stream: Option<String>,

    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    /// Handler attempts before an inbound entry is dead-lettered
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u32,

    /// Pause in milliseconds while failed entries wait for a retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.drift_stream.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_DRIFT_STREAM"));
        }
        if self.consumer_group.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_CONSUMER_GROUP"));
        }
        if self.max_deliveries == 0 {
            return Err(ValidationError::MustBePositive("REDIS_MAX_DELIVERIES"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            timeout_secs: default_timeout(),
            drift_stream: default_drift_stream(),
            assigned_stream: default_assigned_stream(),
            events_stream: default_events_stream(),
            observation_stream: None,
            consumer_group: default_consumer_group(),
            consumer_name: default_consumer_name(),
            max_deliveries: default_max_deliveries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_timeout() -> u64 {
    5
}

fn default_drift_stream() -> String {
    "drift.events".to_string()
}

fn default_assigned_stream() -> String {
    "profile.assigned".to_string()
}

fn default_events_stream() -> String {
    "profile.events".to_string()
}

fn default_consumer_group() -> String {
    "profile-assignment".to_string()
}

fn default_consumer_name() -> String {
    "profile-assignment-1".to_string()
}

fn default_max_deliveries() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    2000
}
