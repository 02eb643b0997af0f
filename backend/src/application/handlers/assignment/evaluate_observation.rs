//! EvaluateObservationHandler - the profile assigner.
//!
//! Drives one user's assignment state machine with one observation:
//!
//! 1. load the user's snapshot (state + every ranking state)
//! 2. validate the observation for the active weight mode
//! 3. score all profiles, record the full ranking, count the prompt
//! 4. apply the mode's assignment criteria to the leading profile
//! 5. commit the snapshot with a version check
//! 6. publish `profile.assigned.v1` if an assignment was made
//!
//! A rejected observation fails before step 3, so ranking state and the
//! prompt count are untouched. A publish failure after a successful commit
//! is logged and does not fail the call.

use std::sync::Arc;

use crate::domain::assignment::{
    AssignmentError, AssignmentOutcome, AssignmentPolicy, ConfidenceLevel, ProfileAssigned,
    ProfileMode,
};
use crate::domain::catalog::ProfileCatalog;
use crate::domain::foundation::{CommandMetadata, EventEnvelope, ProfileId, Timestamp, UserId};
use crate::domain::matching::{BehavioralObservation, MatchResult, ProfileMatcher};
use crate::ports::{AssignmentStore, EventPublisher};

use super::UserLocks;

/// One observation for one user.
#[derive(Debug, Clone)]
pub struct EvaluateObservationCommand {
    pub user_id: UserId,
    pub observation: BehavioralObservation,
    /// Upstream message that produced the observation; becomes the
    /// assignment event's causation ID.
    pub trigger_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EvaluateObservationResult {
    pub status: AssignmentOutcome,
    /// Band of the leading profile's average score.
    pub confidence_level: ConfidenceLevel,
    /// Profile assigned after this evaluation, whether new or kept.
    pub assigned_profile_id: Option<ProfileId>,
    /// Mode after this evaluation.
    pub mode: ProfileMode,
    pub prompt_count: u64,
    pub match_result: MatchResult,
    pub event: Option<ProfileAssigned>,
}

impl EvaluateObservationResult {
    pub fn is_assigned(&self) -> bool {
        self.status == AssignmentOutcome::Assigned
    }
}

pub struct EvaluateObservationHandler {
    store: Arc<dyn AssignmentStore>,
    event_publisher: Arc<dyn EventPublisher>,
    catalog: Arc<ProfileCatalog>,
    matcher: ProfileMatcher,
    policy: AssignmentPolicy,
    locks: Arc<UserLocks>,
}

impl EvaluateObservationHandler {
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        event_publisher: Arc<dyn EventPublisher>,
        catalog: Arc<ProfileCatalog>,
        matcher: ProfileMatcher,
        policy: AssignmentPolicy,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            store,
            event_publisher,
            catalog,
            matcher,
            policy,
            locks,
        }
    }

    pub fn locks(&self) -> &Arc<UserLocks> {
        &self.locks
    }

    pub async fn handle(
        &self,
        cmd: EvaluateObservationCommand,
        metadata: CommandMetadata,
    ) -> Result<EvaluateObservationResult, AssignmentError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;
        self.evaluate_locked(cmd, &metadata).await
    }

    /// Evaluates with the caller already holding the user's lock.
    pub(crate) async fn evaluate_locked(
        &self,
        cmd: EvaluateObservationCommand,
        metadata: &CommandMetadata,
    ) -> Result<EvaluateObservationResult, AssignmentError> {
        // 1. Load snapshot
        let mut snapshot = self
            .store
            .load(&cmd.user_id)
            .await?
            .ok_or_else(|| AssignmentError::unknown_user(cmd.user_id.clone()))?;
        let mode = snapshot.state.mode();
        let weight_mode = mode.weight_mode();

        // 2. Validate before touching anything
        cmd.observation.validate_for(weight_mode)?;

        // 3. Score and record
        let now = Timestamp::now();
        let match_result = self.matcher.score(&cmd.observation, &self.catalog, weight_mode);
        snapshot.rankings.record_observation(&match_result, now);
        snapshot.state.record_prompt(now);

        // 4. Apply criteria to the leader
        let leader = snapshot.rankings.top().cloned();
        let confidence_level = leader
            .as_ref()
            .map(|l| self.policy.confidence_for(l.average_score()))
            .unwrap_or(ConfidenceLevel::Low);

        let event = match leader.filter(|l| self.policy.should_assign(mode, l)) {
            Some(leader) => {
                let decided_in = snapshot.state.assign(leader.profile_id().clone(), now)?;
                Some(ProfileAssigned::new(
                    cmd.user_id.clone(),
                    leader.profile_id().clone(),
                    confidence_level,
                    decided_in,
                    cmd.trigger_id.clone(),
                    now,
                ))
            }
            None => None,
        };

        // 5. Commit
        self.store.commit(&snapshot).await?;

        // 6. Publish
        let status = match &event {
            Some(assigned) => {
                tracing::info!(
                    user_id = %cmd.user_id,
                    profile_id = %assigned.assigned_profile_id,
                    confidence = %assigned.confidence_level,
                    mode = %assigned.mode,
                    prompt_count = snapshot.state.prompt_count(),
                    "profile assigned"
                );
                self.publish(assigned, cmd.trigger_id.as_deref(), metadata).await;
                AssignmentOutcome::Assigned
            }
            None => {
                tracing::debug!(
                    user_id = %cmd.user_id,
                    mode = %mode,
                    leader = ?match_result.best_profile_id(),
                    "observation recorded; no assignment"
                );
                AssignmentOutcome::Undetermined
            }
        };

        Ok(EvaluateObservationResult {
            status,
            confidence_level,
            assigned_profile_id: snapshot.state.assigned_profile_id().cloned(),
            mode: snapshot.state.mode(),
            prompt_count: snapshot.state.prompt_count(),
            match_result,
            event,
        })
    }

    async fn publish(
        &self,
        event: &ProfileAssigned,
        trigger_id: Option<&str>,
        metadata: &CommandMetadata,
    ) {
        let envelope = match EventEnvelope::from_event(event) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(user_id = %event.user_id, error = %e, "could not encode assignment event");
                return;
            }
        };
        let mut envelope = metadata
            .apply_to(envelope)
            .with_user_id(event.user_id.to_string());
        if let Some(trigger) = trigger_id {
            envelope = envelope.with_causation_id(trigger);
        }

        if let Err(e) = self.event_publisher.publish(envelope).await {
            tracing::warn!(
                user_id = %event.user_id,
                profile_id = %event.assigned_profile_id,
                error = %e,
                "assignment committed but event publish failed"
            );
        }
    }
}
