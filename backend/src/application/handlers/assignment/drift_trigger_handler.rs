//! DriftTriggerHandler - event handler for upstream `drift.detected` triggers.
//!
//! For a MODERATE or STRONG trigger it:
//! 1. Moves the user into drift fallback (if currently HYBRID or DYNAMIC_ONLY)
//! 2. Fetches the user's most recent observations
//! 3. Re-evaluates them in order under fallback criteria
//!
//! WEAK triggers and unknown users are acknowledged without action. A fetch
//! failure is returned as an error so the trigger is redelivered; by then
//! the user is already in fallback, so the retry goes straight to step 2.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::assignment::{AssignmentError, ProfileMode};
use crate::domain::drift::DriftSeverity;
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventEnvelope, UserId,
};
use crate::ports::{EventHandler, RecentBehaviorSource};

use super::{
    DetectDriftHandler, EnterDriftFallbackCommand, ProcessDriftBatchCommand,
    ProcessDriftBatchHandler,
};

/// Payload of an upstream drift trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftTrigger {
    pub drift_event_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub severity: DriftSeverity,
}

pub struct DriftTriggerHandler {
    drift: Arc<DetectDriftHandler>,
    batch: Arc<ProcessDriftBatchHandler>,
    behavior_source: Arc<dyn RecentBehaviorSource>,
    batch_limit: usize,
}

impl DriftTriggerHandler {
    pub fn new(
        drift: Arc<DetectDriftHandler>,
        batch: Arc<ProcessDriftBatchHandler>,
        behavior_source: Arc<dyn RecentBehaviorSource>,
        batch_limit: usize,
    ) -> Self {
        Self {
            drift,
            batch,
            behavior_source,
            batch_limit,
        }
    }
}

#[async_trait]
impl EventHandler for DriftTriggerHandler {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let trigger: DriftTrigger = serde_json::from_value(event.payload.clone())
            .map_err(|e| DomainError::new(ErrorCode::ValidationFailed, e.to_string()))?;

        let Some(user_id) = trigger
            .user_id
            .as_deref()
            .and_then(|id| UserId::new(id).ok())
        else {
            tracing::warn!(drift_event_id = %trigger.drift_event_id, "drift trigger without user id; ignoring");
            return Ok(());
        };

        if !trigger.severity.is_actionable() {
            tracing::debug!(user_id = %user_id, severity = %trigger.severity, "weak drift trigger ignored");
            return Ok(());
        }

        let metadata = CommandMetadata::new()
            .with_correlation_id(
                event
                    .metadata
                    .correlation_id
                    .clone()
                    .unwrap_or_else(|| trigger.drift_event_id.clone()),
            )
            .with_causation_id(trigger.drift_event_id.clone())
            .with_source("drift-trigger");

        // 1. Enter fallback
        let entered = self
            .drift
            .enter_fallback(
                EnterDriftFallbackCommand {
                    user_id: user_id.clone(),
                    severity: trigger.severity,
                    trigger_id: Some(trigger.drift_event_id.clone()),
                },
                metadata.clone(),
            )
            .await;
        let mode = match entered {
            Ok(result) => result.mode,
            Err(AssignmentError::UnknownUser(_)) => {
                tracing::warn!(user_id = %user_id, "drift trigger for unregistered user; ignoring");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if mode != ProfileMode::DriftFallback {
            return Ok(());
        }

        // 2. Fetch recent behavior
        let observations = self
            .behavior_source
            .recent(&user_id, self.batch_limit)
            .await?;
        if observations.is_empty() {
            tracing::info!(user_id = %user_id, "no recent behavior to re-evaluate");
            return Ok(());
        }

        // 3. Re-evaluate in order
        let result = self
            .batch
            .handle(
                ProcessDriftBatchCommand {
                    user_id,
                    observations,
                    trigger_id: Some(trigger.drift_event_id),
                },
                metadata,
            )
            .await?;
        tracing::debug!(
            processed = result.processed,
            skipped = result.skipped,
            reassigned = result.assignment.is_some(),
            "drift trigger handled"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DriftTriggerHandler"
    }
}
