//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_format")]
    pub format: String,
}

impl LoggingConfig {
    pub fn log_format(&self) -> Result<LogFormat, ValidationError> {
        match self.format.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ValidationError::InvalidLogFormat(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.log_format().map(|_| ())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}
