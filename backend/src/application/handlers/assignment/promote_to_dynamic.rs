//! PromoteToDynamicHandler - hands a HYBRID user over to a dynamic profile.
//!
//! Whether a dynamic profile is mature enough is decided elsewhere; this
//! only performs the mode change.

use std::sync::Arc;

use crate::domain::assignment::{AssignmentError, UserAssignmentState};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::AssignmentStore;

use super::UserLocks;

#[derive(Debug, Clone)]
pub struct PromoteToDynamicCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct PromoteToDynamicResult {
    pub state: UserAssignmentState,
}

pub struct PromoteToDynamicHandler {
    store: Arc<dyn AssignmentStore>,
    locks: Arc<UserLocks>,
}

impl PromoteToDynamicHandler {
    pub fn new(store: Arc<dyn AssignmentStore>, locks: Arc<UserLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn handle(
        &self,
        cmd: PromoteToDynamicCommand,
    ) -> Result<PromoteToDynamicResult, AssignmentError> {
        let _guard = self.locks.acquire(&cmd.user_id).await;

        let mut snapshot = self
            .store
            .load(&cmd.user_id)
            .await?
            .ok_or_else(|| AssignmentError::unknown_user(cmd.user_id.clone()))?;

        snapshot.state.promote_to_dynamic(Timestamp::now())?;
        self.store.commit(&snapshot).await?;

        tracing::info!(user_id = %cmd.user_id, "promoted to dynamic profile");
        Ok(PromoteToDynamicResult {
            state: snapshot.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::assignment::test_support::{registered_store, user};
    use crate::domain::assignment::ProfileMode;
    use crate::domain::foundation::ProfileId;

    #[tokio::test]
    async fn hybrid_user_is_promoted() {
        let store = registered_store().await;
        let mut snapshot = store.load(&user()).await.unwrap().unwrap();
        snapshot
            .state
            .assign(ProfileId::new("P2").unwrap(), Timestamp::now())
            .unwrap();
        store.commit(&snapshot).await.unwrap();
        let handler = PromoteToDynamicHandler::new(store.clone(), Arc::new(UserLocks::new()));

        let result = handler
            .handle(PromoteToDynamicCommand { user_id: user() })
            .await
            .unwrap();

        assert_eq!(result.state.mode(), ProfileMode::DynamicOnly);
        let stored = store.load(&user()).await.unwrap().unwrap();
        assert_eq!(stored.state.mode(), ProfileMode::DynamicOnly);
    }

    #[tokio::test]
    async fn cold_start_user_cannot_be_promoted() {
        let store = registered_store().await;
        let handler = PromoteToDynamicHandler::new(store.clone(), Arc::new(UserLocks::new()));

        let err = handler
            .handle(PromoteToDynamicCommand { user_id: user() })
            .await
            .unwrap_err();

        assert!(matches!(err, AssignmentError::InvalidModeTransition { .. }));
        let stored = store.load(&user()).await.unwrap().unwrap();
        assert_eq!(stored.state.version(), 0);
    }
}
