//! Profile matcher: scores one observation against every catalog profile.

use serde::Serialize;

use super::{BehavioralObservation, MatchingWeights, WeightMode};
use crate::domain::catalog::{Profile, ProfileCatalog};
use crate::domain::foundation::ProfileId;

/// Level-fit score when the observation's level is outside the profile's set.
const LEVEL_MISMATCH_SCORE: f64 = 0.5;

/// Per-factor affinities behind a raw score.
///
/// `behavior` is reported for diagnostics; neither weight configuration
/// assigns it a weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub intent: f64,
    pub interest: f64,
    pub behavior: f64,
    pub signal: f64,
}

/// One profile's outcome for one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileScore {
    pub profile_id: ProfileId,
    pub raw_score: f64,
    pub normalized_score: f64,
    /// 1-based position, 1 = best.
    pub rank: u32,
    pub components: ScoreComponents,
}

/// Rank-ordered scores for every profile.
///
/// Ranks are contiguous from 1 and exactly one entry holds rank 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    ranked: Vec<ProfileScore>,
}

impl MatchResult {
    /// Normalizes and ranks raw scores.
    ///
    /// A zero total gives every profile an equal share. Ties are broken by
    /// ascending profile ID.
    pub fn from_components(entries: Vec<(ProfileId, ScoreComponents, f64)>) -> Self {
        let total: f64 = entries.iter().map(|(_, _, raw)| *raw).sum();
        let count = entries.len().max(1) as f64;

        let mut ranked: Vec<ProfileScore> = entries
            .into_iter()
            .map(|(profile_id, components, raw_score)| {
                let normalized_score = if total > 0.0 {
                    raw_score / total
                } else {
                    1.0 / count
                };
                ProfileScore {
                    profile_id,
                    raw_score,
                    normalized_score,
                    rank: 0,
                    components,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.normalized_score
                .total_cmp(&a.normalized_score)
                .then_with(|| a.profile_id.cmp(&b.profile_id))
        });
        for (position, score) in ranked.iter_mut().enumerate() {
            score.rank = position as u32 + 1;
        }

        Self { ranked }
    }

    /// Convenience for callers that only have raw totals.
    pub fn from_raw_scores(scores: impl IntoIterator<Item = (ProfileId, f64)>) -> Self {
        Self::from_components(
            scores
                .into_iter()
                .map(|(id, raw)| (id, ScoreComponents::default(), raw))
                .collect(),
        )
    }

    /// Scores in descending order.
    pub fn ranked(&self) -> &[ProfileScore] {
        &self.ranked
    }

    pub fn best(&self) -> Option<&ProfileScore> {
        self.ranked.first()
    }

    pub fn best_profile_id(&self) -> Option<&ProfileId> {
        self.best().map(|s| &s.profile_id)
    }

    /// Normalized score of the winner.
    pub fn best_confidence(&self) -> f64 {
        self.best().map(|s| s.normalized_score).unwrap_or(0.0)
    }

    pub fn score_for(&self, profile_id: &ProfileId) -> Option<&ProfileScore> {
        self.ranked.iter().find(|s| &s.profile_id == profile_id)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Pure scoring function over the catalog.
#[derive(Debug, Clone)]
pub struct ProfileMatcher {
    standard: MatchingWeights,
    cold_start: MatchingWeights,
}

impl Default for ProfileMatcher {
    fn default() -> Self {
        Self::new(MatchingWeights::standard(), MatchingWeights::cold_start())
    }
}

impl ProfileMatcher {
    pub fn new(standard: MatchingWeights, cold_start: MatchingWeights) -> Self {
        Self {
            standard,
            cold_start,
        }
    }

    pub fn weights(&self, mode: WeightMode) -> &MatchingWeights {
        match mode {
            WeightMode::Standard => &self.standard,
            WeightMode::ColdStart => &self.cold_start,
        }
    }

    /// Scores every profile in the catalog.
    pub fn score(
        &self,
        observation: &BehavioralObservation,
        catalog: &ProfileCatalog,
        mode: WeightMode,
    ) -> MatchResult {
        let weights = self.weights(mode);
        let entries: Vec<_> = catalog
            .iter()
            .map(|profile| {
                let components = components_for(observation, profile);
                let raw = raw_score(weights, observation, &components);
                tracing::debug!(
                    profile_id = %profile.id(),
                    ?mode,
                    intent = components.intent,
                    interest = components.interest,
                    behavior = components.behavior,
                    signal = components.signal,
                    raw,
                    "profile score"
                );
                (profile.id().clone(), components, raw)
            })
            .collect();

        if entries.iter().all(|(_, _, raw)| *raw <= 0.0) {
            tracing::warn!(
                ?mode,
                profiles = entries.len(),
                "every profile scored zero; using equal shares"
            );
        }
        MatchResult::from_components(entries)
    }
}

fn components_for(observation: &BehavioralObservation, profile: &Profile) -> ScoreComponents {
    let intent = observation
        .intents
        .iter()
        .map(|(name, score)| score * profile.intent_weight(name))
        .sum();
    let interest = observation
        .interests
        .iter()
        .map(|(name, score)| score * profile.interest_weight(name))
        .sum();
    let signal = observation
        .signals
        .iter()
        .map(|(name, score)| score * profile.signal_weight(name))
        .sum();
    let behavior = if profile.accepts_level(observation.behavior_level) {
        1.0
    } else {
        LEVEL_MISMATCH_SCORE
    };

    ScoreComponents {
        intent,
        interest,
        behavior,
        signal,
    }
}

fn raw_score(
    weights: &MatchingWeights,
    observation: &BehavioralObservation,
    components: &ScoreComponents,
) -> f64 {
    let mut raw = weights.intent * components.intent
        + weights.interest * components.interest
        + weights.style * components.signal;
    // Zero-weight scalars may legitimately be absent.
    if weights.complexity > 0.0 {
        raw += weights.complexity * observation.complexity.unwrap_or(0.0);
    }
    if weights.consistency > 0.0 {
        raw += weights.consistency * observation.consistency.unwrap_or(0.0);
    }
    raw
}
