//! DetectDriftHandler - compares the assigned profile against the leader
//! and moves the user into drift fallback on a MODERATE or STRONG finding.

use std::sync::Arc;

use crate::domain::assignment::{AssignmentError, DriftFallbackEntered, ProfileMode};
use crate::domain::drift::{DriftFinding, DriftPolicy, DriftSeverity};
use crate::domain::foundation::{CommandMetadata, EventEnvelope, ProfileId, Timestamp, UserId};
use crate::ports::{AssignmentSnapshot, AssignmentStore, EventPublisher};

use super::UserLocks;

/// On-demand drift check.
#[derive(Debug, Clone)]
pub struct DetectDriftCommand {
    pub user_id: UserId,
}

/// Fallback entry requested by an upstream drift signal.
#[derive(Debug, Clone)]
pub struct EnterDriftFallbackCommand {
    pub user_id: UserId,
    pub severity: DriftSeverity,
    pub trigger_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetectDriftResult {
    pub finding: DriftFinding,
    /// Mode after handling.
    pub mode: ProfileMode,
    pub event: Option<DriftFallbackEntered>,
}

impl DetectDriftResult {
    pub fn entered_fallback(&self) -> bool {
        self.event.is_some()
    }
}

pub struct DetectDriftHandler {
    store: Arc<dyn AssignmentStore>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: DriftPolicy,
    locks: Arc<UserLocks>,
}

impl DetectDriftHandler {
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: DriftPolicy,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            store,
            event_publisher,
            policy,
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: DetectDriftCommand,
        metadata: CommandMetadata,
    ) -> Result<DetectDriftResult, AssignmentError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;

        // 1. Load snapshot
        let snapshot = self.load(&cmd.user_id).await?;

        // 2. Detect
        let finding = match snapshot.state.assigned_profile_id() {
            Some(assigned) => self.policy.detect(assigned, &snapshot.rankings),
            None => DriftFinding::none(),
        };
        tracing::debug!(
            user_id = %cmd.user_id,
            severity = ?finding.severity,
            candidate = ?finding.candidate_profile_id,
            "drift check"
        );

        // 3. Act on MODERATE / STRONG only
        let actionable = finding.severity.filter(|_| finding.is_actionable());
        match actionable {
            Some(severity) => {
                let candidate = finding.candidate_profile_id.clone();
                let (mode, event) = self
                    .apply_fallback(snapshot, severity, candidate, None, &metadata)
                    .await?;
                Ok(DetectDriftResult {
                    finding,
                    mode,
                    event,
                })
            }
            None => Ok(DetectDriftResult {
                finding,
                mode: snapshot.state.mode(),
                event: None,
            }),
        }
    }

    /// Moves the user into fallback on an upstream signal, without
    /// re-deriving severity. The candidate is the current leader when it is
    /// not the assigned profile.
    pub async fn enter_fallback(
        &self,
        cmd: EnterDriftFallbackCommand,
        metadata: CommandMetadata,
    ) -> Result<DetectDriftResult, AssignmentError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;
        let snapshot = self.load(&cmd.user_id).await?;

        let candidate = snapshot
            .rankings
            .top()
            .map(|leader| leader.profile_id().clone())
            .filter(|leader| snapshot.state.assigned_profile_id() != Some(leader));
        let finding = DriftFinding {
            has_drift: true,
            severity: Some(cmd.severity),
            candidate_profile_id: candidate.clone(),
        };

        if !cmd.severity.is_actionable() {
            return Ok(DetectDriftResult {
                finding,
                mode: snapshot.state.mode(),
                event: None,
            });
        }

        let (mode, event) = self
            .apply_fallback(
                snapshot,
                cmd.severity,
                candidate,
                cmd.trigger_id.as_deref(),
                &metadata,
            )
            .await?;
        Ok(DetectDriftResult {
            finding,
            mode,
            event,
        })
    }

    async fn load(&self, user_id: &UserId) -> Result<AssignmentSnapshot, AssignmentError> {
        self.store
            .load(user_id)
            .await?
            .ok_or_else(|| AssignmentError::unknown_user(user_id.clone()))
    }

    /// Transition, commit and publish. Only `HYBRID` and `DYNAMIC_ONLY`
    /// move; a user already in fallback is left as is and a cold-start
    /// user has nothing to drift from.
    async fn apply_fallback(
        &self,
        mut snapshot: AssignmentSnapshot,
        severity: DriftSeverity,
        candidate: Option<ProfileId>,
        trigger_id: Option<&str>,
        metadata: &CommandMetadata,
    ) -> Result<(ProfileMode, Option<DriftFallbackEntered>), AssignmentError> {
        let mode = snapshot.state.mode();
        match mode {
            ProfileMode::Hybrid | ProfileMode::DynamicOnly => {}
            ProfileMode::DriftFallback => {
                tracing::debug!(user_id = %snapshot.user_id(), "already in drift fallback");
                return Ok((mode, None));
            }
            ProfileMode::ColdStart => {
                tracing::warn!(
                    user_id = %snapshot.user_id(),
                    %severity,
                    "drift signal for a user without an assignment; ignoring"
                );
                return Ok((mode, None));
            }
        }

        let now = Timestamp::now();
        let previous = snapshot.state.assigned_profile_id().cloned();
        snapshot.state.enter_drift_fallback(candidate.clone(), now)?;
        self.store.commit(&snapshot).await?;

        let event = DriftFallbackEntered::new(
            snapshot.user_id().clone(),
            severity,
            previous,
            candidate,
            trigger_id.map(str::to_string),
            now,
        );
        tracing::info!(
            user_id = %event.user_id,
            %severity,
            from = %mode,
            candidate = ?event.candidate_profile_id,
            "entered drift fallback"
        );
        self.publish(&event, trigger_id, metadata).await;

        Ok((ProfileMode::DriftFallback, Some(event)))
    }

    async fn publish(
        &self,
        event: &DriftFallbackEntered,
        trigger_id: Option<&str>,
        metadata: &CommandMetadata,
    ) {
        let envelope = match EventEnvelope::from_event(event) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(user_id = %event.user_id, error = %e, "could not encode drift event");
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
                error = %e,
                "drift fallback committed but event publish failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryAssignmentStore;
    use crate::application::handlers::assignment::test_support::{registered_store, user};
    use crate::domain::assignment::DRIFT_FALLBACK_ENTERED;
    use crate::domain::ranking::{RankingState, UserRankings};

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    fn state(id: &str, average: f64, rank: u32, top: u32, drop: u32) -> RankingState {
        RankingState::reconstitute(pid(id), average * 10.0, 10, average, Some(rank), top, drop, None)
    }

    /// `u1` assigned to P1 with the given ranking states committed.
    async fn assigned_store(states: Vec<RankingState>) -> Arc<InMemoryAssignmentStore> {
        let store = registered_store().await;
        let mut snapshot = store.load(&user()).await.unwrap().unwrap();
        snapshot.state.assign(pid("P1"), Timestamp::now()).unwrap();
        snapshot.rankings = UserRankings::reconstitute(user(), states);
        store.commit(&snapshot).await.unwrap();
        store
    }

    fn handler(store: Arc<InMemoryAssignmentStore>, bus: Arc<InMemoryEventBus>) -> DetectDriftHandler {
        DetectDriftHandler::new(store, bus, DriftPolicy::default(), Arc::new(UserLocks::new()))
    }

    #[tokio::test]
    async fn strong_drift_enters_fallback_with_candidate() {
        let store =
            assigned_store(vec![state("P1", 0.72, 4, 0, 3), state("P3", 0.75, 1, 3, 0)]).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = handler(store.clone(), bus.clone());

        let result = handler
            .handle(DetectDriftCommand { user_id: user() }, CommandMetadata::new())
            .await
            .unwrap();

        assert_eq!(result.finding.severity, Some(DriftSeverity::Strong));
        assert_eq!(result.finding.candidate_profile_id, Some(pid("P3")));
        assert!(result.entered_fallback());
        assert_eq!(result.mode, ProfileMode::DriftFallback);

        let snapshot = store.load(&user()).await.unwrap().unwrap();
        assert_eq!(snapshot.state.mode(), ProfileMode::DriftFallback);
        assert_eq!(snapshot.state.fallback_profile_id(), Some(&pid("P3")));
        assert_eq!(snapshot.state.assigned_profile_id(), Some(&pid("P1")));
        assert_eq!(bus.events_of_type(DRIFT_FALLBACK_ENTERED).len(), 1);
    }

    #[tokio::test]
    async fn weak_drift_changes_nothing() {
        let store =
            assigned_store(vec![state("P1", 0.72, 2, 0, 1), state("P3", 0.75, 1, 1, 0)]).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = handler(store.clone(), bus.clone());

        let result = handler
            .handle(DetectDriftCommand { user_id: user() }, CommandMetadata::new())
            .await
            .unwrap();

        assert_eq!(result.finding.severity, Some(DriftSeverity::Weak));
        assert!(!result.entered_fallback());
        assert_eq!(result.mode, ProfileMode::Hybrid);
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn cold_start_user_has_no_drift() {
        let store = registered_store().await;
        let handler = handler(store, Arc::new(InMemoryEventBus::new()));

        let result = handler
            .handle(DetectDriftCommand { user_id: user() }, CommandMetadata::new())
            .await
            .unwrap();

        assert!(!result.finding.has_drift);
        assert_eq!(result.mode, ProfileMode::ColdStart);
    }

    #[tokio::test]
    async fn upstream_signal_enters_fallback_once() {
        let store =
            assigned_store(vec![state("P1", 0.72, 2, 0, 1), state("P3", 0.75, 1, 1, 0)]).await;
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = handler(store.clone(), bus.clone());
        let cmd = EnterDriftFallbackCommand {
            user_id: user(),
            severity: DriftSeverity::Moderate,
            trigger_id: Some("drift-9".to_string()),
        };

        let first = handler.enter_fallback(cmd.clone(), CommandMetadata::new()).await.unwrap();
        let second = handler.enter_fallback(cmd, CommandMetadata::new()).await.unwrap();

        assert!(first.entered_fallback());
        assert!(!second.entered_fallback());
        assert_eq!(second.mode, ProfileMode::DriftFallback);

        let events = bus.events_of_type(DRIFT_FALLBACK_ENTERED);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.causation_id.as_deref(), Some("drift-9"));
        assert_eq!(events[0].payload["candidate_profile_id"], "P3");
    }

    #[tokio::test]
    async fn weak_upstream_signal_is_ignored() {
        let store =
            assigned_store(vec![state("P1", 0.72, 1, 2, 0), state("P3", 0.75, 2, 0, 0)]).await;
        let handler = handler(store.clone(), Arc::new(InMemoryEventBus::new()));

        let result = handler
            .enter_fallback(
                EnterDriftFallbackCommand {
                    user_id: user(),
                    severity: DriftSeverity::Weak,
                    trigger_id: None,
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.mode, ProfileMode::Hybrid);
        assert!(result.finding.candidate_profile_id.is_none());
    }
}
