//! In-memory expertise repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::features::DomainExpertise;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::ExpertiseRepository;

#[derive(Default)]
pub struct InMemoryExpertiseRepository {
    states: RwLock<BTreeMap<(UserId, String), DomainExpertise>>,
}

impl InMemoryExpertiseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpertiseRepository for InMemoryExpertiseRepository {
    async fn find(
        &self,
        user_id: &UserId,
        interest: &str,
    ) -> Result<Option<DomainExpertise>, DomainError> {
        Ok(self
            .states
            .read()
            .await
            .get(&(user_id.clone(), interest.to_string()))
            .cloned())
    }

    async fn upsert(&self, expertise: &DomainExpertise) -> Result<(), DomainError> {
        self.states.write().await.insert(
            (expertise.user_id().clone(), expertise.interest().to_string()),
            expertise.clone(),
        );
        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<DomainExpertise>, DomainError> {
        Ok(self
            .states
            .read()
            .await
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, state)| state.clone())
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<DomainExpertise>, DomainError> {
        Ok(self.states.read().await.values().cloned().collect())
    }
}
