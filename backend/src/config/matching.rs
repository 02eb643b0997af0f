//! Matching weight configuration

use serde::Deserialize;

use crate::domain::matching::{MatchingWeights, ProfileMatcher};

use super::error::ValidationError;

/// The two factor weightings the matcher scores with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "MatchingWeights::standard")]
    pub standard: MatchingWeights,

    #[serde(default = "MatchingWeights::cold_start")]
    pub cold_start: MatchingWeights,
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.standard.validate("matching.standard")?;
        self.cold_start.validate("matching.cold_start")?;
        Ok(())
    }

    pub fn matcher(&self) -> ProfileMatcher {
        ProfileMatcher::new(self.standard, self.cold_start)
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            standard: MatchingWeights::standard(),
            cold_start: MatchingWeights::cold_start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        assert!(MatchingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_not_summing_to_one_are_rejected() {
        let config = MatchingConfig {
            standard: MatchingWeights {
                intent: 0.5,
                interest: 0.5,
                complexity: 0.2,
                style: 0.0,
                consistency: 0.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Engine(_))
        ));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let config = MatchingConfig {
            cold_start: MatchingWeights {
                intent: 1.2,
                interest: -0.2,
                complexity: 0.0,
                style: 0.0,
                consistency: 0.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
