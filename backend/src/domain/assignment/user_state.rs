//! Per-user assignment aggregate.

use serde::Serialize;

use super::{AssignmentError, ProfileMode};
use crate::domain::foundation::{ProfileId, StateMachine, Timestamp, UserId};

/// A user's assignment lifecycle.
///
/// # Invariants
///
/// - created in `COLD_START` with no assigned profile
/// - `assigned_profile_id` is set whenever mode is not `COLD_START`
/// - mode changes follow [`ProfileMode`]'s transition table
/// - `version` is the persisted version this copy was loaded at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAssignmentState {
    user_id: UserId,
    mode: ProfileMode,
    assigned_profile_id: Option<ProfileId>,
    fallback_profile_id: Option<ProfileId>,
    prompt_count: u64,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl UserAssignmentState {
    /// A brand-new user with no history.
    pub fn new(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            mode: ProfileMode::ColdStart,
            assigned_profile_id: None,
            fallback_profile_id: None,
            prompt_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        user_id: UserId,
        mode: ProfileMode,
        assigned_profile_id: Option<ProfileId>,
        fallback_profile_id: Option<ProfileId>,
        prompt_count: u64,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            mode,
            assigned_profile_id,
            fallback_profile_id,
            prompt_count,
            version,
            created_at,
            updated_at,
        }
    }

    /// Copy stamped with the version a store just persisted.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn record_prompt(&mut self, now: Timestamp) {
        self.prompt_count += 1;
        self.updated_at = now;
    }

    /// Commits an assignment, moving to `HYBRID` and clearing the fallback
    /// marker. Returns the mode the decision was made in.
    pub fn assign(
        &mut self,
        profile_id: ProfileId,
        now: Timestamp,
    ) -> Result<ProfileMode, AssignmentError> {
        let decided_in = self.mode;
        self.mode = self.checked_transition(ProfileMode::Hybrid)?;
        self.assigned_profile_id = Some(profile_id);
        self.fallback_profile_id = None;
        self.updated_at = now;
        Ok(decided_in)
    }

    /// Moves into `DRIFT_FALLBACK`, remembering the candidate the user is
    /// drifting toward. Returns false when already in fallback.
    pub fn enter_drift_fallback(
        &mut self,
        candidate: Option<ProfileId>,
        now: Timestamp,
    ) -> Result<bool, AssignmentError> {
        let was_in_fallback = self.mode == ProfileMode::DriftFallback;
        self.mode = self.checked_transition(ProfileMode::DriftFallback)?;
        if candidate.is_some() {
            self.fallback_profile_id = candidate;
        }
        self.updated_at = now;
        Ok(!was_in_fallback)
    }

    /// Hands the user over to a dynamic profile.
    pub fn promote_to_dynamic(&mut self, now: Timestamp) -> Result<(), AssignmentError> {
        self.mode = self.checked_transition(ProfileMode::DynamicOnly)?;
        self.updated_at = now;
        Ok(())
    }

    fn checked_transition(&self, target: ProfileMode) -> Result<ProfileMode, AssignmentError> {
        self.mode
            .transition_to(target)
            .map_err(|_| AssignmentError::InvalidModeTransition {
                from: self.mode,
                to: target,
            })
    }

    // ─── Accessors ───

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn mode(&self) -> ProfileMode {
        self.mode
    }

    pub fn assigned_profile_id(&self) -> Option<&ProfileId> {
        self.assigned_profile_id.as_ref()
    }

    pub fn fallback_profile_id(&self) -> Option<&ProfileId> {
        self.fallback_profile_id.as_ref()
    }

    pub fn prompt_count(&self) -> u64 {
        self.prompt_count
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    fn fresh() -> UserAssignmentState {
        UserAssignmentState::new(UserId::new("u1").unwrap(), Timestamp::now())
    }

    #[test]
    fn new_user_starts_cold() {
        let state = fresh();
        assert_eq!(state.mode(), ProfileMode::ColdStart);
        assert!(state.assigned_profile_id().is_none());
        assert_eq!(state.prompt_count(), 0);
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn assignment_moves_cold_start_to_hybrid() {
        let mut state = fresh();
        let decided_in = state.assign(pid("P3"), Timestamp::now()).unwrap();
        assert_eq!(decided_in, ProfileMode::ColdStart);
        assert_eq!(state.mode(), ProfileMode::Hybrid);
        assert_eq!(state.assigned_profile_id(), Some(&pid("P3")));
    }

    #[test]
    fn hybrid_cannot_be_reassigned_directly() {
        let mut state = fresh();
        state.assign(pid("P3"), Timestamp::now()).unwrap();
        let err = state.assign(pid("P1"), Timestamp::now()).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidModeTransition { .. }));
        assert_eq!(state.assigned_profile_id(), Some(&pid("P3")));
    }

    #[test]
    fn drift_then_reassign_clears_fallback() {
        let mut state = fresh();
        state.assign(pid("P1"), Timestamp::now()).unwrap();
        assert!(state.enter_drift_fallback(Some(pid("P3")), Timestamp::now()).unwrap());
        assert_eq!(state.fallback_profile_id(), Some(&pid("P3")));

        let decided_in = state.assign(pid("P3"), Timestamp::now()).unwrap();
        assert_eq!(decided_in, ProfileMode::DriftFallback);
        assert_eq!(state.mode(), ProfileMode::Hybrid);
        assert!(state.fallback_profile_id().is_none());
    }

    #[test]
    fn repeated_drift_is_a_no_op() {
        let mut state = fresh();
        state.assign(pid("P1"), Timestamp::now()).unwrap();
        assert!(state.enter_drift_fallback(None, Timestamp::now()).unwrap());
        assert!(!state.enter_drift_fallback(None, Timestamp::now()).unwrap());
        assert_eq!(state.mode(), ProfileMode::DriftFallback);
    }

    #[test]
    fn cold_start_cannot_drift() {
        let mut state = fresh();
        assert!(state.enter_drift_fallback(None, Timestamp::now()).is_err());
    }

    #[test]
    fn dynamic_only_requires_hybrid() {
        let mut state = fresh();
        assert!(state.promote_to_dynamic(Timestamp::now()).is_err());
        state.assign(pid("P2"), Timestamp::now()).unwrap();
        state.promote_to_dynamic(Timestamp::now()).unwrap();
        assert_eq!(state.mode(), ProfileMode::DynamicOnly);
        assert!(state.enter_drift_fallback(None, Timestamp::now()).unwrap());
    }

    #[test]
    fn record_prompt_counts() {
        let mut state = fresh();
        state.record_prompt(Timestamp::now());
        state.record_prompt(Timestamp::now());
        assert_eq!(state.prompt_count(), 2);
    }
}
