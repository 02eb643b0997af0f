//! Behavioral consistency estimate in `[0, 1]`.

use std::collections::{BTreeMap, HashMap};

/// Returned when there is not enough history to see a pattern.
pub const DEFAULT_CONSISTENCY: f64 = 0.5;

const INTENT_WEIGHT: f64 = 0.40;
const DOMAIN_WEIGHT: f64 = 0.40;
const TEMPORAL_WEIGHT: f64 = 0.20;
const SIGNAL_WEIGHT: f64 = 0.10;

/// Share of the temporal weight given to intent transitions; domains get the rest.
const TEMPORAL_INTENT_SHARE: f64 = 0.6;

pub struct ConsistencyCalculator;

impl ConsistencyCalculator {
    /// Scores chronologically ordered intent and domain histories, with an
    /// optional per-prompt signal history.
    pub fn from_history(
        intents: &[String],
        domains: &[String],
        signals: Option<&[BTreeMap<String, f64>]>,
    ) -> f64 {
        if intents.len() <= 1 {
            return DEFAULT_CONSISTENCY;
        }

        let intent = repetition(intents) * INTENT_WEIGHT;
        let domain = repetition(domains) * DOMAIN_WEIGHT;
        let temporal = (stability(intents) * TEMPORAL_INTENT_SHARE
            + stability(domains) * (1.0 - TEMPORAL_INTENT_SHARE))
            * TEMPORAL_WEIGHT;
        let signal = signals
            .filter(|s| !s.is_empty())
            .map(|s| signal_dominance(s) * SIGNAL_WEIGHT)
            .unwrap_or(0.0);

        let score = ((intent + domain + temporal + signal).clamp(0.0, 1.0) * 100.0).round() / 100.0;
        tracing::debug!(intent, domain, temporal, score, "consistency from history");
        score
    }
}

fn counts(items: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item.as_str()).or_insert(0) += 1;
    }
    counts
}

/// 1.0 when one item dominates entirely, 0.0 when evenly spread.
fn repetition(items: &[String]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let counts = counts(items);
    if counts.len() == 1 {
        return 1.0;
    }
    let top = counts.values().copied().max().unwrap_or(0) as f64;
    let dominance = top / items.len() as f64;
    let floor = 1.0 / counts.len() as f64;
    ((dominance - floor) / (1.0 - floor)).clamp(0.0, 1.0)
}

/// One minus the fraction of adjacent pairs that differ.
fn stability(items: &[String]) -> f64 {
    if items.len() < 2 {
        return 1.0;
    }
    let changes = items.windows(2).filter(|w| w[0] != w[1]).count();
    1.0 - changes as f64 / (items.len() - 1) as f64
}

fn signal_dominance(history: &[BTreeMap<String, f64>]) -> f64 {
    let dominant: Vec<String> = history
        .iter()
        .filter_map(|signals| {
            signals
                .iter()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(name, _)| name.clone())
        })
        .collect();
    if dominant.is_empty() {
        return 0.0;
    }
    let top = counts(&dominant).values().copied().max().unwrap_or(0) as f64;
    top / dominant.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(items: &[&str]) -> Vec<String> {
        items.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn single_prompt_gets_default() {
        assert_eq!(
            ConsistencyCalculator::from_history(&s(&["LEARNING"]), &s(&["AI"]), None),
            DEFAULT_CONSISTENCY
        );
        assert_eq!(ConsistencyCalculator::from_history(&[], &[], None), DEFAULT_CONSISTENCY);
    }

    #[test]
    fn identical_history_is_fully_consistent() {
        let intents = s(&["LEARNING", "LEARNING", "LEARNING"]);
        let domains = s(&["AI", "AI", "AI"]);
        assert_eq!(ConsistencyCalculator::from_history(&intents, &domains, None), 1.0);
    }

    #[test]
    fn alternating_history_scores_low() {
        let intents = s(&["LEARNING", "CREATIVE", "LEARNING", "CREATIVE"]);
        let domains = s(&["AI", "ART", "AI", "ART"]);
        assert_eq!(ConsistencyCalculator::from_history(&intents, &domains, None), 0.0);
    }

    #[test]
    fn dominant_signal_adds_bonus() {
        let intents = s(&["LEARNING", "CREATIVE", "LEARNING", "CREATIVE"]);
        let domains = s(&["AI", "ART", "AI", "ART"]);
        let signals = vec![
            BTreeMap::from([("MULTI_STEP".to_string(), 0.9)]),
            BTreeMap::from([("MULTI_STEP".to_string(), 0.8), ("CASUAL".to_string(), 0.1)]),
        ];
        assert_eq!(
            ConsistencyCalculator::from_history(&intents, &domains, Some(&signals)),
            0.1
        );
    }
}
