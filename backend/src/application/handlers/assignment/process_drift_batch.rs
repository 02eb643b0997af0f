//! ProcessDriftBatchHandler - re-evaluates a user in drift fallback against
//! a batch of recent observations.
//!
//! The user's lock is held for the whole batch and observations run strictly
//! in order, because each one's streak counters depend on the previous one.
//! Every observation is committed on its own; if the caller abandons the
//! batch, those already applied stay applied.
//!
//! An observation rejected with a non-retryable error is logged and skipped,
//! so the batch still completes and its trigger is not redelivered over
//! observations that were already committed. Retryable failures stop the
//! batch and propagate.

use std::sync::Arc;

use crate::domain::assignment::{AssignmentError, ProfileAssigned, ProfileMode};
use crate::domain::foundation::{CommandMetadata, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::AssignmentStore;

use super::{EvaluateObservationCommand, EvaluateObservationHandler};

#[derive(Debug, Clone)]
pub struct ProcessDriftBatchCommand {
    pub user_id: UserId,
    /// Oldest first.
    pub observations: Vec<BehavioralObservation>,
    pub trigger_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessDriftBatchResult {
    /// Observations evaluated before the batch stopped.
    pub processed: usize,
    /// Observations rejected and left out of the ranking.
    pub skipped: usize,
    pub assignment: Option<ProfileAssigned>,
    pub mode: ProfileMode,
}

pub struct ProcessDriftBatchHandler {
    store: Arc<dyn AssignmentStore>,
    assigner: Arc<EvaluateObservationHandler>,
}

impl ProcessDriftBatchHandler {
    pub fn new(store: Arc<dyn AssignmentStore>, assigner: Arc<EvaluateObservationHandler>) -> Self {
        Self { store, assigner }
    }

    pub async fn handle(
        &self,
        cmd: ProcessDriftBatchCommand,
        metadata: CommandMetadata,
    ) -> Result<ProcessDriftBatchResult, AssignmentError> {
        let _guard = self.assigner.locks().acquire(&cmd.user_id).await;

        let mode = self
            .store
            .load(&cmd.user_id)
            .await?
            .map(|snapshot| snapshot.state.mode())
            .ok_or_else(|| AssignmentError::unknown_user(cmd.user_id.clone()))?;
        if mode != ProfileMode::DriftFallback {
            tracing::debug!(user_id = %cmd.user_id, %mode, "not in drift fallback; batch skipped");
            return Ok(ProcessDriftBatchResult {
                processed: 0,
                skipped: 0,
                assignment: None,
                mode,
            });
        }

        let total = cmd.observations.len();
        let mut processed = 0;
        let mut skipped = 0;
        let mut mode = mode;
        for (position, observation) in cmd.observations.into_iter().enumerate() {
            let evaluated = self
                .assigner
                .evaluate_locked(
                    EvaluateObservationCommand {
                        user_id: cmd.user_id.clone(),
                        observation,
                        trigger_id: cmd.trigger_id.clone(),
                    },
                    &metadata,
                )
                .await;
            let result = match evaluated {
                Ok(result) => result,
                Err(e) if e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        user_id = %cmd.user_id,
                        position,
                        error = %e,
                        "skipping drift batch observation"
                    );
                    skipped += 1;
                    continue;
                }
            };
            processed += 1;
            mode = result.mode;

            if result.event.is_some() {
                tracing::info!(
                    user_id = %cmd.user_id,
                    processed,
                    skipped,
                    total,
                    "drift batch reassigned user"
                );
                return Ok(ProcessDriftBatchResult {
                    processed,
                    skipped,
                    assignment: result.event,
                    mode,
                });
            }
        }

        tracing::info!(
            user_id = %cmd.user_id,
            processed,
            skipped,
            "drift batch finished without reassignment"
        );
        Ok(ProcessDriftBatchResult {
            processed,
            skipped,
            assignment: None,
            mode,
        })
    }
}
