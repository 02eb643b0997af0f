//! In-memory assignment store with optimistic version checks.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::assignment::UserAssignmentState;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::ranking::UserRankings;
use crate::ports::{AssignmentSnapshot, AssignmentStore};

/// Snapshots keyed by user. Each commit replaces the whole snapshot under
/// one write lock, so readers never see a half-applied observation.
#[derive(Default)]
pub struct InMemoryAssignmentStore {
    snapshots: RwLock<HashMap<UserId, AssignmentSnapshot>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

fn conflict(user_id: &UserId, stored: u64, attempted: u64) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentUpdateConflict,
        format!(
            "Stale assignment state for {}: stored version {}, commit based on {}",
            user_id, stored, attempted
        ),
    )
    .with_detail("user_id", user_id.to_string())
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn create_user(&self, state: &UserAssignmentState) -> Result<(), DomainError> {
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(state.user_id()) {
            return Err(DomainError::new(
                ErrorCode::UserAlreadyExists,
                format!("User already registered: {}", state.user_id()),
            )
            .with_detail("user_id", state.user_id().to_string()));
        }
        let state = state.clone().with_version(0);
        let rankings = UserRankings::new(state.user_id().clone());
        snapshots.insert(
            state.user_id().clone(),
            AssignmentSnapshot::new(state, rankings),
        );
        Ok(())
    }

    async fn load(&self, user_id: &UserId) -> Result<Option<AssignmentSnapshot>, DomainError> {
        Ok(self.snapshots.read().await.get(user_id).cloned())
    }

    async fn commit(&self, snapshot: &AssignmentSnapshot) -> Result<(), DomainError> {
        let mut snapshots = self.snapshots.write().await;
        let stored = snapshots.get_mut(snapshot.user_id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::UserNotFound,
                format!("User not registered: {}", snapshot.user_id()),
            )
            .with_detail("user_id", snapshot.user_id().to_string())
        })?;

        let stored_version = stored.state.version();
        if stored_version != snapshot.state.version() {
            return Err(conflict(
                snapshot.user_id(),
                stored_version,
                snapshot.state.version(),
            ));
        }

        *stored = AssignmentSnapshot::new(
            snapshot.state.clone().with_version(stored_version + 1),
            snapshot.rankings.clone(),
        );
        Ok(())
    }
}
