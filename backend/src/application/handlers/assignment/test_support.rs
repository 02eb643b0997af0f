//! Shared fixtures for assignment handler tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::memory::InMemoryAssignmentStore;
use crate::domain::assignment::UserAssignmentState;
use crate::domain::catalog::BehaviorLevel;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, Timestamp, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::{AssignmentStore, EventPublisher};

pub fn user() -> UserId {
    UserId::new("u1").unwrap()
}

/// Store with `u1` registered in cold start.
pub async fn registered_store() -> Arc<InMemoryAssignmentStore> {
    let store = Arc::new(InMemoryAssignmentStore::new());
    store
        .create_user(&UserAssignmentState::new(user(), Timestamp::now()))
        .await
        .unwrap();
    store
}

/// Scores P3 at 0.90 under cold-start weights.
pub fn technical_observation() -> BehavioralObservation {
    BehavioralObservation::new(BehaviorLevel::Advanced)
        .with_intent("PROBLEM_SOLVING", 1.0)
        .with_interest("PROGRAMMING", 1.0)
        .with_signal("DEEP_REASONING", 0.8)
        .with_complexity(0.7)
        .with_consistency(0.6)
}

/// Scores P1 at 0.96 under standard weights.
pub fn learning_observation() -> BehavioralObservation {
    BehavioralObservation::new(BehaviorLevel::Basic)
        .with_intent("LEARNING", 1.0)
        .with_interest("SCIENCE", 1.0)
        .with_signal("DETAILED_EXPLANATION", 1.0)
        .with_signal("DEEP_REASONING", 1.0)
        .with_complexity(1.0)
        .with_consistency(1.0)
}

pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: EventEnvelope) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::CacheError, "stream unavailable"))
    }

    async fn publish_all(&self, _events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::CacheError, "stream unavailable"))
    }
}
