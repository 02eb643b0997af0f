//! RegisterUserHandler - creates the cold-start assignment state for a user.

use std::sync::Arc;

use crate::domain::assignment::{AssignmentError, UserAssignmentState};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::AssignmentStore;

#[derive(Debug, Clone)]
pub struct RegisterUserCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct RegisterUserResult {
    pub state: UserAssignmentState,
}

/// A user must be registered before the first observation is evaluated.
pub struct RegisterUserHandler {
    store: Arc<dyn AssignmentStore>,
}

impl RegisterUserHandler {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: RegisterUserCommand,
    ) -> Result<RegisterUserResult, AssignmentError> {
        let state = UserAssignmentState::new(cmd.user_id, Timestamp::now());
        self.store.create_user(&state).await?;

        tracing::info!(user_id = %state.user_id(), "registered user in cold start");
        Ok(RegisterUserResult { state })
    }
}
