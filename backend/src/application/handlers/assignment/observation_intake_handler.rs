//! ObservationIntakeHandler - event handler for the inbound observation feed.
//!
//! Each `observation.received` message carries one user's scored behavior.
//! The observation updates domain expertise and is then evaluated by the
//! assigner. Errors the sender cannot fix by retrying (unknown user,
//! malformed observation) are logged and dropped; conflicts and port
//! failures are returned so the message is redelivered.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::handlers::expertise::{UpdateExpertiseCommand, UpdateExpertiseHandler};
use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, EventEnvelope, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::EventHandler;

use super::{EvaluateObservationCommand, EvaluateObservationHandler};

pub const OBSERVATION_RECEIVED: &str = "observation.received";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationReceived {
    pub user_id: UserId,
    pub observation: BehavioralObservation,
    #[serde(default)]
    pub trigger_id: Option<String>,
}

pub struct ObservationIntakeHandler {
    assigner: Arc<EvaluateObservationHandler>,
    expertise: Arc<UpdateExpertiseHandler>,
}

impl ObservationIntakeHandler {
    pub fn new(
        assigner: Arc<EvaluateObservationHandler>,
        expertise: Arc<UpdateExpertiseHandler>,
    ) -> Self {
        Self {
            assigner,
            expertise,
        }
    }
}

#[async_trait]
impl EventHandler for ObservationIntakeHandler {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let message: ObservationReceived = serde_json::from_value(event.payload.clone())
            .map_err(|e| DomainError::new(ErrorCode::ValidationFailed, e.to_string()))?;
        let trigger_id = message
            .trigger_id
            .clone()
            .unwrap_or_else(|| event.event_id.to_string());

        let mut metadata = CommandMetadata::new()
            .with_causation_id(trigger_id.clone())
            .with_source("intake");
        if let Some(correlation) = &event.metadata.correlation_id {
            metadata = metadata.with_correlation_id(correlation.clone());
        }

        let evaluated = self
            .assigner
            .handle(
                EvaluateObservationCommand {
                    user_id: message.user_id.clone(),
                    observation: message.observation.clone(),
                    trigger_id: Some(trigger_id),
                },
                metadata,
            )
            .await;
        match evaluated {
            Ok(_) => {}
            Err(e) if e.is_retryable() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    user_id = %message.user_id,
                    error = %e,
                    "dropping observation"
                );
                return Ok(());
            }
        }

        self.expertise
            .handle(UpdateExpertiseCommand {
                user_id: message.user_id,
                observation: message.observation,
            })
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ObservationIntakeHandler"
    }
}
