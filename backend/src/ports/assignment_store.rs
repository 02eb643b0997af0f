//! Assignment store port.
//!
//! Persists a user's assignment state together with every profile's
//! ranking state. Both halves are written in one commit so a reader never
//! observes rankings from one observation next to a mode from another.

use async_trait::async_trait;

use crate::domain::assignment::UserAssignmentState;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::ranking::UserRankings;

/// Everything the engine knows about one user.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSnapshot {
    pub state: UserAssignmentState,
    pub rankings: UserRankings,
}

impl AssignmentSnapshot {
    pub fn new(state: UserAssignmentState, rankings: UserRankings) -> Self {
        Self { state, rankings }
    }

    pub fn user_id(&self) -> &UserId {
        self.state.user_id()
    }
}

/// Repository port for per-user assignment snapshots.
///
/// Writes use optimistic concurrency: `commit` succeeds only when the
/// stored version still equals `snapshot.state.version()`, and bumps it
/// by one.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Store a fresh user at version 0.
    ///
    /// # Errors
    ///
    /// - `UserAlreadyExists` if the user is already stored
    /// - `DatabaseError` on persistence failure
    async fn create_user(&self, state: &UserAssignmentState) -> Result<(), DomainError>;

    /// Load the full snapshot. Returns `None` for unknown users.
    async fn load(&self, user_id: &UserId) -> Result<Option<AssignmentSnapshot>, DomainError>;

    /// Atomically replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// - `ConcurrentUpdateConflict` (with a `user_id` detail) when the stored
    ///   version moved since the snapshot was loaded
    /// - `UserNotFound` if the user was never created
    /// - `DatabaseError` on persistence failure
    async fn commit(&self, snapshot: &AssignmentSnapshot) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn AssignmentStore) {}
}
