//! Profile mode state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::matching::WeightMode;

/// Lifecycle mode of a user's profile assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileMode {
    /// No assignment yet; scored with intent and interest only.
    ColdStart,

    /// A predefined profile is assigned and observations track trends.
    Hybrid,

    /// A mature dynamic profile has taken over (decided elsewhere).
    DynamicOnly,

    /// Behavior drifted away from the assigned profile; re-evaluating.
    DriftFallback,
}

impl ProfileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileMode::ColdStart => "COLD_START",
            ProfileMode::Hybrid => "HYBRID",
            ProfileMode::DynamicOnly => "DYNAMIC_ONLY",
            ProfileMode::DriftFallback => "DRIFT_FALLBACK",
        }
    }

    /// Weight configuration used to score observations in this mode.
    pub fn weight_mode(&self) -> WeightMode {
        match self {
            ProfileMode::ColdStart => WeightMode::ColdStart,
            _ => WeightMode::Standard,
        }
    }

    /// Whether an observation in this mode can lead to an assignment.
    pub fn assigns(&self) -> bool {
        matches!(self, ProfileMode::ColdStart | ProfileMode::DriftFallback)
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProfileMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COLD_START" => Ok(ProfileMode::ColdStart),
            "HYBRID" => Ok(ProfileMode::Hybrid),
            "DYNAMIC_ONLY" => Ok(ProfileMode::DynamicOnly),
            "DRIFT_FALLBACK" => Ok(ProfileMode::DriftFallback),
            other => Err(ValidationError::invalid_format(
                "mode",
                format!("unknown profile mode {}", other),
            )),
        }
    }
}

impl StateMachine for ProfileMode {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ProfileMode::*;
        matches!(
            (self, target),
            (ColdStart, Hybrid)
                | (Hybrid, DynamicOnly)
                | (Hybrid, DriftFallback)
                | (DynamicOnly, DriftFallback)
                | (DriftFallback, Hybrid)
                | (DriftFallback, DriftFallback)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProfileMode::*;
        match self {
            ColdStart => vec![Hybrid],
            Hybrid => vec![DynamicOnly, DriftFallback],
            DynamicOnly => vec![DriftFallback],
            DriftFallback => vec![Hybrid, DriftFallback],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProfileMode::*;

    const ALL: [ProfileMode; 4] = [ColdStart, Hybrid, DynamicOnly, DriftFallback];

    #[test]
    fn cold_start_only_moves_to_hybrid() {
        assert!(ColdStart.can_transition_to(&Hybrid));
        assert!(!ColdStart.can_transition_to(&DriftFallback));
        assert!(!ColdStart.can_transition_to(&DynamicOnly));
    }

    #[test]
    fn drift_fallback_returns_to_hybrid() {
        assert_eq!(DriftFallback.transition_to(Hybrid), Ok(Hybrid));
        assert!(DriftFallback.transition_to(ColdStart).is_err());
    }

    #[test]
    fn dynamic_only_can_only_drift() {
        assert_eq!(DynamicOnly.valid_transitions(), vec![DriftFallback]);
        assert!(DynamicOnly.transition_to(Hybrid).is_err());
    }

    #[test]
    fn no_mode_is_terminal() {
        for mode in ALL {
            assert!(!mode.is_terminal(), "{} should not be terminal", mode);
        }
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn only_cold_start_uses_cold_start_weights() {
        assert_eq!(ColdStart.weight_mode(), WeightMode::ColdStart);
        assert_eq!(DriftFallback.weight_mode(), WeightMode::Standard);
        assert_eq!(Hybrid.weight_mode(), WeightMode::Standard);
    }

    #[test]
    fn parses_and_displays_wire_names() {
        for mode in ALL {
            assert_eq!(mode.as_str().parse::<ProfileMode>().unwrap(), mode);
        }
        assert!("UNKNOWN".parse::<ProfileMode>().is_err());
        assert_eq!(serde_json::to_string(&DriftFallback).unwrap(), "\"DRIFT_FALLBACK\"");
    }
}
