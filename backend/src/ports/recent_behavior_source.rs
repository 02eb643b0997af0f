//! Recent behavior source port.
//!
//! When a drift trigger arrives the engine re-examines the user's latest
//! observations. Where those come from (behavior service, test fixture)
//! is an adapter concern.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::matching::BehavioralObservation;

#[async_trait]
pub trait RecentBehaviorSource: Send + Sync {
    /// Up to `limit` recent observations, oldest first.
    ///
    /// # Errors
    ///
    /// - `ExternalServiceError` when the source is unreachable or replies
    ///   with something unparseable
    async fn recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BehavioralObservation>, DomainError>;
}
