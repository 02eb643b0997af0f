//! Drift detection over a user's ranking states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ProfileId, UnitScore, ValidationError};
use crate::domain::ranking::UserRankings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftSeverity {
    Weak,
    Moderate,
    Strong,
}

impl DriftSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftSeverity::Weak => "WEAK",
            DriftSeverity::Moderate => "MODERATE",
            DriftSeverity::Strong => "STRONG",
        }
    }

    /// MODERATE and STRONG findings move the user into fallback.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, DriftSeverity::Weak)
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DriftSeverity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WEAK" => Ok(DriftSeverity::Weak),
            "MODERATE" => Ok(DriftSeverity::Moderate),
            "STRONG" => Ok(DriftSeverity::Strong),
            other => Err(ValidationError::invalid_format(
                "severity",
                format!("unknown drift severity {}", other),
            )),
        }
    }
}

/// Outcome of a drift check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftFinding {
    pub has_drift: bool,
    pub severity: Option<DriftSeverity>,
    pub candidate_profile_id: Option<ProfileId>,
}

impl DriftFinding {
    pub fn none() -> Self {
        Self {
            has_drift: false,
            severity: None,
            candidate_profile_id: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.severity.map(|s| s.is_actionable()).unwrap_or(false)
    }
}

/// Tunable severity thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftPolicy {
    pub moderate_drop: u32,
    pub moderate_top: u32,
    pub strong_drop: u32,
    pub strong_top: u32,
    /// Assigned-profile average below which drift is always STRONG.
    pub score_floor: f64,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            moderate_drop: 2,
            moderate_top: 2,
            strong_drop: 3,
            strong_top: 3,
            score_floor: 0.50,
        }
    }
}

impl DriftPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        UnitScore::try_new("drift.score_floor", self.score_floor)?;
        if self.strong_drop < self.moderate_drop || self.strong_top < self.moderate_top {
            return Err(ValidationError::invalid_format(
                "drift",
                "strong thresholds must not be below moderate thresholds",
            ));
        }
        Ok(())
    }

    /// Compares the assigned profile against the current leader.
    pub fn detect(&self, assigned: &ProfileId, rankings: &UserRankings) -> DriftFinding {
        let Some(current) = rankings.get(assigned) else {
            return DriftFinding::none();
        };
        if current.observation_count() == 0 || current.is_top() {
            return DriftFinding::none();
        }

        let leader = rankings.top();
        let leader_streak = leader.map(|s| s.consecutive_top_count()).unwrap_or(0);
        let drop = current.consecutive_drop_count();

        let severity = if (drop >= self.strong_drop && leader_streak >= self.strong_top)
            || current.average_score() < self.score_floor
        {
            DriftSeverity::Strong
        } else if drop >= self.moderate_drop && leader_streak >= self.moderate_top {
            DriftSeverity::Moderate
        } else {
            DriftSeverity::Weak
        };

        DriftFinding {
            has_drift: true,
            severity: Some(severity),
            candidate_profile_id: leader.map(|s| s.profile_id().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::ranking::RankingState;

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    fn state(id: &str, average: f64, rank: u32, top: u32, drop: u32) -> RankingState {
        RankingState::reconstitute(pid(id), average * 10.0, 10, average, Some(rank), top, drop, None)
    }

    fn rankings(states: Vec<RankingState>) -> UserRankings {
        UserRankings::reconstitute(UserId::new("u").unwrap(), states)
    }

    #[test]
    fn assigned_leader_has_no_drift() {
        let r = rankings(vec![state("P1", 0.3, 1, 4, 0), state("P3", 0.8, 2, 0, 0)]);
        assert_eq!(DriftPolicy::default().detect(&pid("P1"), &r), DriftFinding::none());
    }

    #[test]
    fn long_drop_against_stable_leader_is_strong() {
        let r = rankings(vec![state("P1", 0.72, 4, 0, 3), state("P3", 0.75, 1, 3, 0)]);
        let finding = DriftPolicy::default().detect(&pid("P1"), &r);
        assert!(finding.has_drift);
        assert_eq!(finding.severity, Some(DriftSeverity::Strong));
        assert_eq!(finding.candidate_profile_id, Some(pid("P3")));
    }

    #[test]
    fn two_drops_against_two_tops_is_moderate() {
        let r = rankings(vec![state("P1", 0.65, 3, 0, 2), state("P3", 0.7, 1, 2, 0)]);
        let finding = DriftPolicy::default().detect(&pid("P1"), &r);
        assert_eq!(finding.severity, Some(DriftSeverity::Moderate));
        assert!(finding.is_actionable());
    }

    #[test]
    fn single_drop_is_weak() {
        let r = rankings(vec![state("P1", 0.65, 2, 0, 1), state("P3", 0.7, 1, 1, 0)]);
        let finding = DriftPolicy::default().detect(&pid("P1"), &r);
        assert_eq!(finding.severity, Some(DriftSeverity::Weak));
        assert!(!finding.is_actionable());
    }

    #[test]
    fn low_average_is_strong_even_without_streaks() {
        let r = rankings(vec![state("P1", 0.45, 2, 0, 0), state("P3", 0.5, 1, 1, 0)]);
        let finding = DriftPolicy::default().detect(&pid("P1"), &r);
        assert_eq!(finding.severity, Some(DriftSeverity::Strong));
    }

    #[test]
    fn untracked_assigned_profile_has_no_drift() {
        let r = rankings(vec![state("P3", 0.7, 1, 1, 0)]);
        assert!(!DriftPolicy::default().detect(&pid("P1"), &r).has_drift);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("moderate".parse::<DriftSeverity>().unwrap(), DriftSeverity::Moderate);
        assert!("SEVERE".parse::<DriftSeverity>().is_err());
    }

    #[test]
    fn policy_rejects_strong_below_moderate() {
        let policy = DriftPolicy {
            strong_drop: 1,
            ..DriftPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
