//! ResetStreaksHandler - manual intervention zeroing one profile's streaks.

use std::sync::Arc;

use crate::domain::assignment::AssignmentError;
use crate::domain::foundation::{ProfileId, Timestamp, UserId};
use crate::ports::AssignmentStore;

use super::UserLocks;

#[derive(Debug, Clone)]
pub struct ResetStreaksCommand {
    pub user_id: UserId,
    pub profile_id: ProfileId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetStreaksResult {
    /// False when the profile has no ranking state for this user yet.
    pub reset: bool,
}

pub struct ResetStreaksHandler {
    store: Arc<dyn AssignmentStore>,
    locks: Arc<UserLocks>,
}

impl ResetStreaksHandler {
    pub fn new(store: Arc<dyn AssignmentStore>, locks: Arc<UserLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn handle(&self, cmd: ResetStreaksCommand) -> Result<ResetStreaksResult, AssignmentError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;

        let mut snapshot = self
            .store
            .load(&cmd.user_id)
            .await?
            .ok_or_else(|| AssignmentError::unknown_user(cmd.user_id.clone()))?;

        if !snapshot.rankings.reset_streaks(&cmd.profile_id, Timestamp::now()) {
            return Ok(ResetStreaksResult { reset: false });
        }
        self.store.commit(&snapshot).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            profile_id = %cmd.profile_id,
            "ranking streaks reset"
        );
        Ok(ResetStreaksResult { reset: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::assignment::test_support::{registered_store, user};
    use crate::domain::ranking::{RankingState, UserRankings};

    fn pid(s: &str) -> ProfileId {
        ProfileId::new(s).unwrap()
    }

    #[tokio::test]
    async fn tracked_profile_is_reset_and_committed() {
        let store = registered_store().await;
        let mut snapshot = store.load(&user()).await.unwrap().unwrap();
        snapshot.rankings = UserRankings::reconstitute(
            user(),
            vec![RankingState::reconstitute(pid("P3"), 4.0, 5, 0.9, Some(1), 5, 0, None)],
        );
        store.commit(&snapshot).await.unwrap();
        let handler = ResetStreaksHandler::new(store.clone(), Arc::new(UserLocks::new()));

        let result = handler
            .handle(ResetStreaksCommand {
                user_id: user(),
                profile_id: pid("P3"),
            })
            .await
            .unwrap();

        assert!(result.reset);
        let stored = store.load(&user()).await.unwrap().unwrap();
        let p3 = stored.rankings.get(&pid("P3")).unwrap();
        assert_eq!(p3.consecutive_top_count(), 0);
        assert_eq!(p3.observation_count(), 5);
    }

    #[tokio::test]
    async fn untracked_profile_is_not_committed() {
        let store = registered_store().await;
        let handler = ResetStreaksHandler::new(store.clone(), Arc::new(UserLocks::new()));

        let result = handler
            .handle(ResetStreaksCommand {
                user_id: user(),
                profile_id: pid("P6"),
            })
            .await
            .unwrap();

        assert!(!result.reset);
        assert_eq!(store.load(&user()).await.unwrap().unwrap().state.version(), 0);
    }
}
