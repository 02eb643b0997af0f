//! Intake configuration - recent-behavior fetches and drift batches

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Root URL of the recent-behavior service. Drift triggers are still
    /// accepted without it, but no fallback batch can be fetched.
    #[serde(default)]
    pub behavior_source_url: Option<String>,

    /// Most observations fed through the assigner per drift trigger
    #[serde(default = "default_drift_batch_limit")]
    pub drift_batch_limit: usize,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Users processed in parallel by a stream consumer
    #[serde(default = "default_max_concurrent_users")]
    pub max_concurrent_users: usize,
}

impl IntakeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.behavior_source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidBehaviorSourceUrl);
            }
        }
        if self.drift_batch_limit == 0 {
            return Err(ValidationError::MustBePositive("intake.drift_batch_limit"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive("intake.fetch_timeout_secs"));
        }
        if self.max_concurrent_users == 0 {
            return Err(ValidationError::MustBePositive("intake.max_concurrent_users"));
        }
        Ok(())
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            behavior_source_url: None,
            drift_batch_limit: default_drift_batch_limit(),
            fetch_timeout_secs: default_fetch_timeout(),
            max_concurrent_users: default_max_concurrent_users(),
        }
    }
}

fn default_drift_batch_limit() -> usize {
    10
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_max_concurrent_users() -> usize {
    16
}
