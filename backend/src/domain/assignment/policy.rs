//! Assignment criteria and confidence bands.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProfileMode;
use crate::domain::foundation::{UnitScore, ValidationError};
use crate::domain::ranking::RankingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentOutcome {
    Assigned,
    Undetermined,
}

/// Thresholds that turn ranking state into an assignment decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentPolicy {
    /// Observations the leading profile needs before a cold-start assignment.
    pub min_prompts_cold_start: u64,
    /// Exposed for operators; fallback reassignment gates on average and
    /// streak only.
    pub min_prompts_fallback: u64,
    pub cold_start_threshold: f64,
    pub fallback_threshold: f64,
    pub high_confidence_threshold: f64,
    pub medium_confidence_threshold: f64,
    pub cold_start_consecutive_top: u32,
    pub fallback_consecutive_top: u32,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            min_prompts_cold_start: 3,
            min_prompts_fallback: 5,
            cold_start_threshold: 0.60,
            fallback_threshold: 0.70,
            high_confidence_threshold: 0.70,
            medium_confidence_threshold: 0.50,
            cold_start_consecutive_top: 2,
            fallback_consecutive_top: 3,
        }
    }
}

impl AssignmentPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        UnitScore::try_new("assignment.cold_start_threshold", self.cold_start_threshold)?;
        UnitScore::try_new("assignment.fallback_threshold", self.fallback_threshold)?;
        UnitScore::try_new(
            "assignment.high_confidence_threshold",
            self.high_confidence_threshold,
        )?;
        UnitScore::try_new(
            "assignment.medium_confidence_threshold",
            self.medium_confidence_threshold,
        )?;
        if self.medium_confidence_threshold > self.high_confidence_threshold {
            return Err(ValidationError::invalid_format(
                "assignment.medium_confidence_threshold",
                "must not exceed high_confidence_threshold",
            ));
        }
        if self.min_prompts_cold_start == 0 {
            return Err(ValidationError::out_of_range(
                "assignment.min_prompts_cold_start",
                1.0,
                f64::from(u32::MAX),
                0.0,
            ));
        }
        Ok(())
    }

    /// Whether the leading profile's state meets the criteria for `mode`.
    ///
    /// `HYBRID` and `DYNAMIC_ONLY` never assign through this path.
    pub fn should_assign(&self, mode: ProfileMode, leader: &RankingState) -> bool {
        match mode {
            ProfileMode::ColdStart => {
                leader.observation_count() >= self.min_prompts_cold_start
                    && leader.average_score() >= self.cold_start_threshold
                    && leader.consecutive_top_count() >= self.cold_start_consecutive_top
            }
            ProfileMode::DriftFallback => {
                leader.average_score() >= self.fallback_threshold
                    && leader.consecutive_top_count() >= self.fallback_consecutive_top
            }
            ProfileMode::Hybrid | ProfileMode::DynamicOnly => false,
        }
    }

    pub fn confidence_for(&self, average_score: f64) -> ConfidenceLevel {
        if average_score >= self.high_confidence_threshold {
            ConfidenceLevel::High
        } else if average_score >= self.medium_confidence_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}
