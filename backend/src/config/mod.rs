//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PROFILE_ASSIGNMENT`
//! prefix and nested values are separated by double underscores.
//!
//! Every section has defaults, so an empty environment yields a runnable
//! local configuration (in-memory stores, no Redis, built-in catalog).
//!
//! # Example
//!
//! ```no_run
//! use profile_assignment::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod intake;
mod logging;
mod matching;
mod redis;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use intake::IntakeConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use matching::MatchingConfig;
pub use redis::RedisConfig;

use serde::Deserialize;

use crate::domain::assignment::AssignmentPolicy;
use crate::domain::catalog::{CatalogError, ProfileCatalog};
use crate::domain::drift::DriftPolicy;

/// Root application configuration
///
/// Load using [`AppConfig::load()`]. Settings are fixed for the lifetime of
/// the process.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Redis streams; events stay in-process when absent
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// PostgreSQL state store; in-memory when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub assignment: AssignmentPolicy,

    #[serde(default)]
    pub drift: DriftPolicy,

    #[serde(default)]
    pub intake: IntakeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// YAML file replacing the built-in profile catalog
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `PROFILE_ASSIGNMENT__REDIS__URL=...` -> `redis.url = ...`
    /// - `PROFILE_ASSIGNMENT__ASSIGNMENT__COLD_START_THRESHOLD=0.65`
    ///   -> `assignment.cold_start_threshold = 0.65`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROFILE_ASSIGNMENT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for malformed URLs, weight sets that do not
    /// sum to 1, thresholds outside `[0, 1]` and zero limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.matching.validate()?;
        self.assignment.validate()?;
        self.drift.validate()?;
        self.intake.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// The configured catalog file, or the built-in catalog.
    pub fn catalog(&self) -> Result<ProfileCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => ProfileCatalog::from_path(path),
            None => ProfileCatalog::builtin(),
        }
    }
}
