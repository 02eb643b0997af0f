//! Assignment domain events.

use serde::{Deserialize, Serialize};

use super::{ConfidenceLevel, ProfileMode};
use crate::domain::drift::DriftSeverity;
use crate::domain::foundation::{domain_event, EventId, ProfileId, Timestamp, UserId};

pub const PROFILE_ASSIGNED: &str = "profile.assigned.v1";
pub const DRIFT_FALLBACK_ENTERED: &str = "profile.drift_fallback_entered.v1";

const AGGREGATE_TYPE: &str = "UserAssignment";

/// A profile was (re)assigned to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAssigned {
    pub event_id: EventId,
    pub user_id: UserId,
    pub assigned_profile_id: ProfileId,
    pub confidence_level: ConfidenceLevel,
    /// Mode the decision was made in (COLD_START or DRIFT_FALLBACK).
    pub mode: ProfileMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
    pub assigned_at: Timestamp,
    pub assigned_at_epoch_seconds: u64,
}

impl ProfileAssigned {
    pub fn new(
        user_id: UserId,
        assigned_profile_id: ProfileId,
        confidence_level: ConfidenceLevel,
        mode: ProfileMode,
        trigger_id: Option<String>,
        assigned_at: Timestamp,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            user_id,
            assigned_profile_id,
            confidence_level,
            mode,
            trigger_id,
            assigned_at,
            assigned_at_epoch_seconds: assigned_at.as_unix_secs(),
        }
    }
}

domain_event!(
    ProfileAssigned,
    event_type = "profile.assigned.v1",
    schema_version = 1,
    aggregate_id = user_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = assigned_at,
    event_id = event_id
);

/// A user was moved into drift fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFallbackEntered {
    pub event_id: EventId,
    pub user_id: UserId,
    pub severity: DriftSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
    pub occurred_at: Timestamp,
}

impl DriftFallbackEntered {
    pub fn new(
        user_id: UserId,
        severity: DriftSeverity,
        previous_profile_id: Option<ProfileId>,
        candidate_profile_id: Option<ProfileId>,
        trigger_id: Option<String>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            user_id,
            severity,
            previous_profile_id,
            candidate_profile_id,
            trigger_id,
            occurred_at,
        }
    }
}

domain_event!(
    DriftFallbackEntered,
    event_type = "profile.drift_fallback_entered.v1",
    schema_version = 1,
    aggregate_id = user_id,
    aggregate_type = AGGREGATE_TYPE,
    occurred_at = occurred_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, EventEnvelope};

    #[test]
    fn profile_assigned_envelope_carries_wire_fields() {
        let at = Timestamp::from_unix_secs(1_700_000_000);
        let event = ProfileAssigned::new(
            UserId::new("u1").unwrap(),
            ProfileId::new("P3").unwrap(),
            ConfidenceLevel::High,
            ProfileMode::ColdStart,
            Some("drift-1".to_string()),
            at,
        );
        let envelope = EventEnvelope::from_event(&event).unwrap();

        assert_eq!(envelope.event_type, PROFILE_ASSIGNED);
        assert_eq!(envelope.aggregate_id, "u1");
        assert_eq!(envelope.payload["assigned_profile_id"], "P3");
        assert_eq!(envelope.payload["confidence_level"], "HIGH");
        assert_eq!(envelope.payload["mode"], "COLD_START");
        assert_eq!(envelope.payload["trigger_id"], "drift-1");
        assert_eq!(envelope.payload["assigned_at_epoch_seconds"], 1_700_000_000u64);
    }

    #[test]
    fn drift_fallback_event_type_matches_constant() {
        let event = DriftFallbackEntered::new(
            UserId::new("u1").unwrap(),
            DriftSeverity::Strong,
            Some(ProfileId::new("P1").unwrap()),
            Some(ProfileId::new("P3").unwrap()),
            None,
            Timestamp::now(),
        );
        assert_eq!(event.event_type(), DRIFT_FALLBACK_ENTERED);
        assert_eq!(event.aggregate_type(), "UserAssignment");
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("trigger_id").is_none());
        assert_eq!(json["severity"], "STRONG");
    }
}
