//! Profile definitions and the behavior level vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::foundation::{ProfileId, UnitScore, ValidationError};

/// Coarse sophistication bucket of a user's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl BehaviorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorLevel::Basic => "BASIC",
            BehaviorLevel::Intermediate => "INTERMEDIATE",
            BehaviorLevel::Advanced => "ADVANCED",
        }
    }
}

impl fmt::Display for BehaviorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A predefined user archetype with weighted affinities.
///
/// # Invariants
///
/// - every weight is in `[0, 1]`
/// - `primary_intent` carries a positive intent weight
/// - `behavior_levels` is non-empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    id: ProfileId,
    name: String,
    description: String,
    primary_intent: String,
    intent_weights: BTreeMap<String, f64>,
    interest_weights: BTreeMap<String, f64>,
    behavior_levels: BTreeSet<BehaviorLevel>,
    signal_weights: BTreeMap<String, f64>,
    ai_guidance: Option<String>,
}

/// Unvalidated profile as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDefinition {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub primary_intent: String,
    #[serde(default)]
    pub intents: BTreeMap<String, f64>,
    #[serde(default)]
    pub interests: BTreeMap<String, f64>,
    pub behavior_levels: BTreeSet<BehaviorLevel>,
    #[serde(default)]
    pub signals: BTreeMap<String, f64>,
    #[serde(default)]
    pub ai_guidance: Option<String>,
}

impl TryFrom<ProfileDefinition> for Profile {
    type Error = ValidationError;

    fn try_from(def: ProfileDefinition) -> Result<Self, Self::Error> {
        if def.name.trim().is_empty() {
            return Err(ValidationError::empty_field(format!("{}.name", def.id)));
        }
        if def.behavior_levels.is_empty() {
            return Err(ValidationError::empty_field(format!(
                "{}.behavior_levels",
                def.id
            )));
        }
        check_weights(&def.id, "intents", &def.intents)?;
        check_weights(&def.id, "interests", &def.interests)?;
        check_weights(&def.id, "signals", &def.signals)?;

        let primary = def.intents.get(&def.primary_intent).copied().unwrap_or(0.0);
        if primary <= 0.0 {
            return Err(ValidationError::invalid_format(
                format!("{}.primary_intent", def.id),
                format!(
                    "primary intent {} must carry a positive weight",
                    def.primary_intent
                ),
            ));
        }

        Ok(Self {
            id: def.id,
            name: def.name,
            description: def.description,
            primary_intent: def.primary_intent,
            intent_weights: def.intents,
            interest_weights: def.interests,
            behavior_levels: def.behavior_levels,
            signal_weights: def.signals,
            ai_guidance: def.ai_guidance,
        })
    }
}

fn check_weights(
    id: &ProfileId,
    group: &str,
    weights: &BTreeMap<String, f64>,
) -> Result<(), ValidationError> {
    for (name, weight) in weights {
        UnitScore::try_new(&format!("{}.{}.{}", id, group, name), *weight)?;
    }
    Ok(())
}

impl Profile {
    // ─── Accessors ───

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn primary_intent(&self) -> &str {
        &self.primary_intent
    }

    pub fn behavior_levels(&self) -> &BTreeSet<BehaviorLevel> {
        &self.behavior_levels
    }

    pub fn ai_guidance(&self) -> Option<&str> {
        self.ai_guidance.as_deref()
    }

    /// Weight for an intent; unknown names weigh zero.
    pub fn intent_weight(&self, intent: &str) -> f64 {
        self.intent_weights.get(intent).copied().unwrap_or(0.0)
    }

    /// Weight for an interest; unknown names weigh zero.
    pub fn interest_weight(&self, interest: &str) -> f64 {
        self.interest_weights.get(interest).copied().unwrap_or(0.0)
    }

    /// Weight for a signal; unknown names weigh zero.
    pub fn signal_weight(&self, signal: &str) -> f64 {
        self.signal_weights.get(signal).copied().unwrap_or(0.0)
    }

    pub fn accepts_level(&self, level: BehaviorLevel) -> bool {
        self.behavior_levels.contains(&level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ProfileDefinition {
        ProfileDefinition {
            id: ProfileId::new("PX").unwrap(),
            name: "Tester".to_string(),
            description: String::new(),
            primary_intent: "LEARNING".to_string(),
            intents: BTreeMap::from([("LEARNING".to_string(), 0.8)]),
            interests: BTreeMap::from([("SCIENCE".to_string(), 0.5)]),
            behavior_levels: BTreeSet::from([BehaviorLevel::Basic]),
            signals: BTreeMap::new(),
            ai_guidance: None,
        }
    }

    #[test]
    fn valid_definition_converts() {
        let profile = Profile::try_from(definition()).unwrap();
        assert_eq!(profile.intent_weight("LEARNING"), 0.8);
        assert_eq!(profile.interest_weight("ART"), 0.0);
        assert!(profile.accepts_level(BehaviorLevel::Basic));
        assert!(!profile.accepts_level(BehaviorLevel::Advanced));
    }

    #[test]
    fn zero_primary_intent_weight_is_rejected() {
        let mut def = definition();
        def.intents.insert("LEARNING".to_string(), 0.0);
        assert!(Profile::try_from(def).is_err());
    }

    #[test]
    fn missing_primary_intent_is_rejected() {
        let mut def = definition();
        def.primary_intent = "CREATIVE".to_string();
        assert!(Profile::try_from(def).is_err());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let mut def = definition();
        def.signals.insert("CASUAL".to_string(), 1.5);
        let err = Profile::try_from(def).unwrap_err();
        assert_eq!(err.field(), "PX.signals.CASUAL");
    }

    #[test]
    fn empty_behavior_levels_are_rejected() {
        let mut def = definition();
        def.behavior_levels.clear();
        assert!(Profile::try_from(def).is_err());
    }

    #[test]
    fn behavior_level_uses_upper_snake_case_on_the_wire() {
        let json = serde_json::to_string(&BehaviorLevel::Intermediate).unwrap();
        assert_eq!(json, "\"INTERMEDIATE\"");
        let level: BehaviorLevel = serde_json::from_str("\"ADVANCED\"").unwrap();
        assert_eq!(level, BehaviorLevel::Advanced);
    }
}
