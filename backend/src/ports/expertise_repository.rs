//! Expertise repository port.

use async_trait::async_trait;

use crate::domain::features::DomainExpertise;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait ExpertiseRepository: Send + Sync {
    async fn find(
        &self,
        user_id: &UserId,
        interest: &str,
    ) -> Result<Option<DomainExpertise>, DomainError>;

    /// Insert or replace the state for `(user, interest)`.
    async fn upsert(&self, expertise: &DomainExpertise) -> Result<(), DomainError>;

    /// All interests tracked for a user, ordered by interest name.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<DomainExpertise>, DomainError>;

    /// Every stored state, used by the idle-decay sweep.
    async fn find_all(&self) -> Result<Vec<DomainExpertise>, DomainError>;
}
