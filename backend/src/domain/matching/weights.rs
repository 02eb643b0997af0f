//! Factor weight configurations used by the matcher.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{UnitScore, ValidationError};

const SUM_TOLERANCE: f64 = 1e-6;

/// Which weight configuration to score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightMode {
    Standard,
    ColdStart,
}

/// Per-factor weights. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingWeights {
    pub intent: f64,
    pub interest: f64,
    pub complexity: f64,
    pub style: f64,
    pub consistency: f64,
}

impl MatchingWeights {
    /// Full five-factor weighting for users with history.
    pub const fn standard() -> Self {
        Self {
            intent: 0.35,
            interest: 0.25,
            complexity: 0.15,
            style: 0.15,
            consistency: 0.10,
        }
    }

    /// Intent and interest only, for users without history.
    pub const fn cold_start() -> Self {
        Self {
            intent: 0.60,
            interest: 0.40,
            complexity: 0.0,
            style: 0.0,
            consistency: 0.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.intent + self.interest + self.complexity + self.style + self.consistency
    }

    /// Each weight in `[0, 1]` and the total equal to 1.
    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        for (factor, value) in [
            ("intent", self.intent),
            ("interest", self.interest),
            ("complexity", self.complexity),
            ("style", self.style),
            ("consistency", self.consistency),
        ] {
            UnitScore::try_new(&format!("{}.{}", name, factor), value)?;
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ValidationError::invalid_format(
                name,
                format!("weights must sum to 1.0, got {:.4}", sum),
            ));
        }
        Ok(())
    }
}
