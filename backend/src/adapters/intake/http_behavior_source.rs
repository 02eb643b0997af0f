//! HTTP client for the behavior resolution service.
//!
//! `GET {base_url}/api/behaviors/{user_id}/recent?limit=N` answers with
//! `{"behaviors": [ ... ]}`, each element an extracted behavioral
//! observation, oldest first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::RecentBehaviorSource;

#[derive(Debug, Clone)]
pub struct HttpBehaviorSourceConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpBehaviorSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RecentBehaviorsResponse {
    #[serde(default)]
    behaviors: Vec<BehavioralObservation>,
}

pub struct HttpBehaviorSource {
    config: HttpBehaviorSourceConfig,
    client: Client,
}

impl HttpBehaviorSource {
    pub fn new(config: HttpBehaviorSourceConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { config, client })
    }

    fn recent_url(&self, user_id: &UserId) -> String {
        format!("{}/api/behaviors/{}/recent", self.config.base_url, user_id)
    }

    fn unavailable(&self, user_id: &UserId, err: reqwest::Error) -> DomainError {
        let reason = if err.is_timeout() {
            format!("timed out after {}s", self.config.timeout.as_secs())
        } else if let Some(status) = err.status() {
            format!("status {}", status)
        } else {
            err.to_string()
        };
        DomainError::new(
            ErrorCode::ExternalServiceError,
            format!("Failed to fetch recent behaviors for {}: {}", user_id, reason),
        )
        .with_detail("user_id", user_id.to_string())
    }
}

#[async_trait]
impl RecentBehaviorSource for HttpBehaviorSource {
    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BehavioralObservation>, DomainError> {
        let response = self
            .client
            .get(self.recent_url(user_id))
            .query(&[("limit", limit)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.unavailable(user_id, e))?;

        let body: RecentBehaviorsResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable(user_id, e))?;

        tracing::debug!(
            user_id = %user_id,
            count = body.behaviors.len(),
            "fetched recent behaviors"
        );
        Ok(body.behaviors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let source =
            HttpBehaviorSource::new(HttpBehaviorSourceConfig::new("http://behaviors:8000/"))
                .unwrap();
        let user = UserId::new("u-42").unwrap();
        assert_eq!(
            source.recent_url(&user),
            "http://behaviors:8000/api/behaviors/u-42/recent"
        );
    }

    #[test]
    fn response_body_parses_observations() {
        let body = r#"{
            "behaviors": [
                {
                    "intents": {"LEARNING": 0.8},
                    "interests": {"PROGRAMMING": 0.7},
                    "behavior_level": "INTERMEDIATE",
                    "signals": {"DETAILED_EXPLANATION": 0.5},
                    "complexity": 0.65,
                    "consistency": 0.72
                }
            ]
        }"#;
        let parsed: RecentBehaviorsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.behaviors.len(), 1);
        assert_eq!(parsed.behaviors[0].complexity, Some(0.65));

        let empty: RecentBehaviorsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.behaviors.is_empty());
    }
}
