//! UpdateExpertiseHandler - folds one observation into the user's
//! per-interest expertise.
//!
//! Every interest with a positive score gets the same confidence delta,
//! derived from behavior level, active signals, consistency and complexity.
//! Interests seen for the first time start from the cold-start confidence.

use std::sync::Arc;

use crate::domain::features::{confidence_delta, DomainExpertise};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::matching::BehavioralObservation;
use crate::ports::ExpertiseRepository;

#[derive(Debug, Clone)]
pub struct UpdateExpertiseCommand {
    pub user_id: UserId,
    pub observation: BehavioralObservation,
}

#[derive(Debug, Clone)]
pub struct UpdateExpertiseResult {
    pub updated: Vec<DomainExpertise>,
}

pub struct UpdateExpertiseHandler {
    repository: Arc<dyn ExpertiseRepository>,
}

impl UpdateExpertiseHandler {
    pub fn new(repository: Arc<dyn ExpertiseRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: UpdateExpertiseCommand,
    ) -> Result<UpdateExpertiseResult, DomainError> {
        let observation = &cmd.observation;
        let delta = confidence_delta(
            observation.behavior_level,
            &observation.signals,
            observation.consistency,
            observation.complexity,
        );
        let now = Timestamp::now();

        let mut updated = Vec::new();
        for (interest, score) in &observation.interests {
            if *score <= 0.0 {
                continue;
            }

            let mut expertise = self
                .repository
                .find(&cmd.user_id, interest)
                .await?
                .unwrap_or_else(|| DomainExpertise::cold_start(cmd.user_id.clone(), interest.clone(), now));
            expertise.apply(delta, now);
            self.repository.upsert(&expertise).await?;

            tracing::debug!(
                user_id = %cmd.user_id,
                interest = %interest,
                confidence = expertise.confidence(),
                level = ?expertise.level(),
                "expertise updated"
            );
            updated.push(expertise);
        }

        Ok(UpdateExpertiseResult { updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryExpertiseRepository;
    use crate::domain::catalog::BehaviorLevel;
    use crate::domain::features::ExpertiseLevel;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn observation() -> BehavioralObservation {
        BehavioralObservation::new(BehaviorLevel::Advanced)
            .with_intent("PROBLEM_SOLVING", 1.0)
            .with_interest("PROGRAMMING", 0.9)
            .with_interest("ART", 0.0)
            .with_signal("MULTI_STEP", 0.8)
            .with_complexity(0.7)
            .with_consistency(0.4)
    }

    #[tokio::test]
    async fn positive_interests_start_cold_and_gain_delta() {
        let repository = Arc::new(InMemoryExpertiseRepository::new());
        let handler = UpdateExpertiseHandler::new(repository.clone());

        let result = handler
            .handle(UpdateExpertiseCommand {
                user_id: user(),
                observation: observation(),
            })
            .await
            .unwrap();

        // 0.20 + ADVANCED 0.20 + MULTI_STEP 0.15 + complexity 0.05
        assert_eq!(result.updated.len(), 1);
        assert!((result.updated[0].confidence() - 0.60).abs() < 1e-9);
        assert_eq!(result.updated[0].level(), ExpertiseLevel::Intermediate);
        assert!(repository.find(&user(), "ART").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_observations_accumulate_and_clamp() {
        let repository = Arc::new(InMemoryExpertiseRepository::new());
        let handler = UpdateExpertiseHandler::new(repository.clone());

        for _ in 0..3 {
            handler
                .handle(UpdateExpertiseCommand {
                    user_id: user(),
                    observation: observation(),
                })
                .await
                .unwrap();
        }

        let stored = repository.find(&user(), "PROGRAMMING").await.unwrap().unwrap();
        assert_eq!(stored.confidence(), 1.0);
        assert_eq!(stored.level(), ExpertiseLevel::Advanced);
    }
}
