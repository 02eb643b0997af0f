//! DecayExpertiseHandler - periodic sweep that decays idle expertise.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::ExpertiseRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayExpertiseResult {
    pub scanned: usize,
    pub decayed: usize,
}

pub struct DecayExpertiseHandler {
    repository: Arc<dyn ExpertiseRepository>,
}

impl DecayExpertiseHandler {
    pub fn new(repository: Arc<dyn ExpertiseRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, now: Timestamp) -> Result<DecayExpertiseResult, DomainError> {
        let all = self.repository.find_all().await?;
        let scanned = all.len();
        let mut decayed = 0;

        for mut expertise in all {
            if expertise.decay(now) {
                self.repository.upsert(&expertise).await?;
                decayed += 1;
            }
        }

        tracing::info!(scanned, decayed, "expertise decay sweep finished");
        Ok(DecayExpertiseResult { scanned, decayed })
    }
}
