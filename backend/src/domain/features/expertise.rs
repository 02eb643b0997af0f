//! Per-domain expertise tracking.
//!
//! Each (user, interest) pair carries a confidence in `[0, 1]` that grows
//! with evidence from behavioral observations and slowly decays when the
//! user stops engaging with the domain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::BehaviorLevel;
use crate::domain::foundation::{Timestamp, UserId};

pub const COLD_START_CONFIDENCE: f64 = 0.20;
pub const DECAY_FACTOR: f64 = 0.98;
pub const DECAY_IDLE_DAYS: i64 = 30;

const BEGINNER_MAX: f64 = 0.39;
const INTERMEDIATE_MAX: f64 = 0.74;

const CONSISTENCY_BONUS: f64 = 0.05;
const COMPLEXITY_BONUS: f64 = 0.05;
const BONUS_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpertiseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExpertiseLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence <= BEGINNER_MAX {
            Self::Beginner
        } else if confidence <= INTERMEDIATE_MAX {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }
}

fn level_delta(level: BehaviorLevel) -> f64 {
    match level {
        BehaviorLevel::Basic => 0.05,
        BehaviorLevel::Intermediate => 0.10,
        BehaviorLevel::Advanced => 0.20,
    }
}

fn signal_delta(signal: &str) -> f64 {
    match signal {
        "DEEP_REASONING" => 0.10,
        "MULTI_STEP" => 0.15,
        "ITERATIVE" => 0.20,
        "GOAL_ORIENTED" => 0.05,
        _ => 0.0,
    }
}

/// Confidence increment for one observation. Signals count when their
/// strength is positive.
pub fn confidence_delta(
    level: BehaviorLevel,
    signals: &BTreeMap<String, f64>,
    consistency: Option<f64>,
    complexity: Option<f64>,
) -> f64 {
    let mut delta = level_delta(level);
    delta += signals
        .iter()
        .filter(|(_, strength)| **strength > 0.0)
        .map(|(name, _)| signal_delta(name))
        .sum::<f64>();
    if consistency.is_some_and(|c| c > BONUS_THRESHOLD) {
        delta += CONSISTENCY_BONUS;
    }
    if complexity.is_some_and(|c| c > BONUS_THRESHOLD) {
        delta += COMPLEXITY_BONUS;
    }
    delta
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainExpertise {
    user_id: UserId,
    interest: String,
    confidence: f64,
    updated_at: Timestamp,
}

impl DomainExpertise {
    pub fn cold_start(user_id: UserId, interest: impl Into<String>, now: Timestamp) -> Self {
        Self {
            user_id,
            interest: interest.into(),
            confidence: COLD_START_CONFIDENCE,
            updated_at: now,
        }
    }

    pub fn reconstitute(
        user_id: UserId,
        interest: String,
        confidence: f64,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            interest,
            confidence: confidence.clamp(0.0, 1.0),
            updated_at,
        }
    }

    /// Adds `delta` and clamps into `[0, 1]`.
    pub fn apply(&mut self, delta: f64, now: Timestamp) {
        self.confidence = (self.confidence + delta).clamp(0.0, 1.0);
        self.updated_at = now;
    }

    /// Multiplies confidence by the decay factor when the state has been idle
    /// for at least the decay window. Returns whether anything changed.
    ///
    /// `updated_at` is left alone so repeated sweeps keep decaying an idle
    /// domain.
    pub fn decay(&mut self, now: Timestamp) -> bool {
        if now.days_since(&self.updated_at) < DECAY_IDLE_DAYS {
            return false;
        }
        self.confidence *= DECAY_FACTOR;
        true
    }

    // ─── Accessors ───

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn interest(&self) -> &str {
        &self.interest
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn level(&self) -> ExpertiseLevel {
        ExpertiseLevel::from_confidence(self.confidence)
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}
