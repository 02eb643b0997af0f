//! Behavioral observation value object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::WeightMode;
use crate::domain::catalog::BehaviorLevel;
use crate::domain::foundation::{UnitScore, ValidationError};

/// One scored snapshot of a user's recent behavior.
///
/// Feature maps are keyed by free-form names (`LEARNING`, `PROGRAMMING`,
/// `MULTI_STEP`, ...). `complexity` and `consistency` are optional because
/// cold-start scoring ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralObservation {
    #[serde(default)]
    pub intents: BTreeMap<String, f64>,
    #[serde(default)]
    pub interests: BTreeMap<String, f64>,
    pub behavior_level: BehaviorLevel,
    #[serde(default)]
    pub signals: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<f64>,
}

impl BehavioralObservation {
    pub fn new(behavior_level: BehaviorLevel) -> Self {
        Self {
            intents: BTreeMap::new(),
            interests: BTreeMap::new(),
            behavior_level,
            signals: BTreeMap::new(),
            complexity: None,
            consistency: None,
        }
    }

    pub fn with_intent(mut self, name: impl Into<String>, score: f64) -> Self {
        self.intents.insert(name.into(), score);
        self
    }

    pub fn with_interest(mut self, name: impl Into<String>, score: f64) -> Self {
        self.interests.insert(name.into(), score);
        self
    }

    pub fn with_signal(mut self, name: impl Into<String>, score: f64) -> Self {
        self.signals.insert(name.into(), score);
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_consistency(mut self, consistency: f64) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Checks the observation is well-formed for the given weight mode.
    ///
    /// Every supplied score must be finite and within `[0, 1]`. Cold-start
    /// needs at least one intent; standard scoring needs complexity and
    /// consistency.
    pub fn validate_for(&self, mode: WeightMode) -> Result<(), ValidationError> {
        check_features("intents", &self.intents)?;
        check_features("interests", &self.interests)?;
        check_features("signals", &self.signals)?;

        match mode {
            WeightMode::ColdStart => {
                if self.intents.is_empty() {
                    return Err(ValidationError::empty_field("intents"));
                }
                if let Some(c) = self.complexity {
                    UnitScore::try_new("complexity", c)?;
                }
                if let Some(c) = self.consistency {
                    UnitScore::try_new("consistency", c)?;
                }
            }
            WeightMode::Standard => {
                let complexity = self
                    .complexity
                    .ok_or_else(|| ValidationError::empty_field("complexity"))?;
                UnitScore::try_new("complexity", complexity)?;
                let consistency = self
                    .consistency
                    .ok_or_else(|| ValidationError::empty_field("consistency"))?;
                UnitScore::try_new("consistency", consistency)?;
            }
        }
        Ok(())
    }
}

fn check_features(group: &str, features: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    for (name, score) in features {
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field(format!("{}.<name>", group)));
        }
        UnitScore::try_new(&format!("{}.{}", group, name), *score)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_observation() -> BehavioralObservation {
        BehavioralObservation::new(BehaviorLevel::Intermediate)
            .with_intent("PROBLEM_SOLVING", 0.8)
            .with_interest("PROGRAMMING", 0.9)
            .with_signal("MULTI_STEP", 0.5)
            .with_complexity(0.6)
            .with_consistency(0.7)
    }

    #[test]
    fn well_formed_observation_passes_both_modes() {
        let obs = standard_observation();
        assert!(obs.validate_for(WeightMode::Standard).is_ok());
        assert!(obs.validate_for(WeightMode::ColdStart).is_ok());
    }

    #[test]
    fn cold_start_requires_intents() {
        let obs = BehavioralObservation::new(BehaviorLevel::Basic).with_interest("ART", 0.5);
        let err = obs.validate_for(WeightMode::ColdStart).unwrap_err();
        assert_eq!(err.field(), "intents");
    }

    #[test]
    fn cold_start_does_not_need_complexity_or_consistency() {
        let obs = BehavioralObservation::new(BehaviorLevel::Basic).with_intent("LEARNING", 1.0);
        assert!(obs.validate_for(WeightMode::ColdStart).is_ok());
    }

    #[test]
    fn standard_requires_complexity_and_consistency() {
        let mut obs = standard_observation();
        obs.consistency = None;
        let err = obs.validate_for(WeightMode::Standard).unwrap_err();
        assert_eq!(err.field(), "consistency");
    }

    #[test]
    fn out_of_range_feature_is_rejected() {
        let obs = standard_observation().with_signal("CASUAL", 1.4);
        let err = obs.validate_for(WeightMode::Standard).unwrap_err();
        assert_eq!(err.field(), "signals.CASUAL");
    }

    #[test]
    fn nan_scalar_is_rejected() {
        let obs = standard_observation().with_complexity(f64::NAN);
        assert!(obs.validate_for(WeightMode::Standard).is_err());
    }

    #[test]
    fn deserializes_from_snake_case_json() {
        let json = r#"{
            "intents": {"LEARNING": 0.9},
            "interests": {"SCIENCE": 0.4},
            "behavior_level": "BASIC",
            "signals": {},
            "complexity": 0.3,
            "consistency": 0.5
        }"#;
        let obs: BehavioralObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.behavior_level, BehaviorLevel::Basic);
        assert_eq!(obs.complexity, Some(0.3));
        assert_eq!(obs.intents.get("LEARNING"), Some(&0.9));
    }
}
