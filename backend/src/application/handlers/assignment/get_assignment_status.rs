//! GetAssignmentStatusHandler - read-only view of a user's assignment.
//!
//! Never scores or writes anything.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::assignment::{AssignmentError, AssignmentPolicy, ConfidenceLevel, ProfileMode};
use crate::domain::foundation::{ProfileId, UserId};
use crate::domain::ranking::RankingState;
use crate::ports::AssignmentStore;

#[derive(Debug, Clone)]
pub struct GetAssignmentStatusQuery {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentStatusView {
    pub user_id: UserId,
    pub status: AssignmentStatus,
    pub confidence_level: ConfidenceLevel,
    pub mode: ProfileMode,
    pub prompt_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_profile_id: Option<ProfileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_profile_id: Option<ProfileId>,
    /// Ranking states in ascending profile order.
    pub rankings: Vec<RankingState>,
}

pub struct GetAssignmentStatusHandler {
    store: Arc<dyn AssignmentStore>,
    policy: AssignmentPolicy,
}

impl GetAssignmentStatusHandler {
    pub fn new(store: Arc<dyn AssignmentStore>, policy: AssignmentPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn handle(
        &self,
        query: GetAssignmentStatusQuery,
    ) -> Result<AssignmentStatusView, AssignmentError> {
        let snapshot = self
            .store
            .load(&query.user_id)
            .await?
            .ok_or_else(|| AssignmentError::unknown_user(query.user_id.clone()))?;
        let state = &snapshot.state;
        let rankings = &snapshot.rankings;

        // Assigned profile's average, else the leader's.
        let basis = state
            .assigned_profile_id()
            .and_then(|id| rankings.get(id))
            .or_else(|| rankings.top());
        let confidence_level = basis
            .map(|s| self.policy.confidence_for(s.average_score()))
            .unwrap_or(ConfidenceLevel::Low);

        let status = if state.assigned_profile_id().is_some() {
            AssignmentStatus::Assigned
        } else {
            AssignmentStatus::Pending
        };

        Ok(AssignmentStatusView {
            user_id: query.user_id,
            status,
            confidence_level,
            mode: state.mode(),
            prompt_count: state.prompt_count(),
            assigned_profile_id: state.assigned_profile_id().cloned(),
            fallback_profile_id: state.fallback_profile_id().cloned(),
            rankings: rankings.iter().cloned().collect(),
        })
    }
}
