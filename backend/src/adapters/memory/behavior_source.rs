//! Fixed recent-behavior source.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::RecentBehaviorSource;

/// Serves observations that were seeded ahead of time. A user can be
/// marked unavailable to simulate a failing upstream.
#[derive(Default)]
pub struct InMemoryBehaviorSource {
    behaviors: RwLock<HashMap<UserId, Vec<BehavioralObservation>>>,
    unavailable: RwLock<Vec<UserId>>,
}

impl InMemoryBehaviorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, user_id: UserId, observations: Vec<BehavioralObservation>) {
        self.behaviors.write().await.insert(user_id, observations);
    }

    pub async fn set_unavailable(&self, user_id: UserId) {
        self.unavailable.write().await.push(user_id);
    }

    pub async fn set_available(&self, user_id: &UserId) {
        self.unavailable.write().await.retain(|id| id != user_id);
    }
}

#[async_trait]
impl RecentBehaviorSource for InMemoryBehaviorSource {
    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BehavioralObservation>, DomainError> {
        if self.unavailable.read().await.contains(user_id) {
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Behavior source unavailable for {}", user_id),
            ));
        }
        let behaviors = self.behaviors.read().await;
        let all = behaviors.get(user_id).map(Vec::as_slice).unwrap_or(&[]);
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }
}
