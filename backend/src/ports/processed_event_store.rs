//! ProcessedEventStore port - idempotency ledger for event handlers.
//!
//! Drift triggers are delivered at-least-once. Recording which trigger IDs
//! a handler has already finished lets redelivered triggers be skipped
//! instead of feeding the same behavior batch through the assigner twice.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventId, Timestamp};

/// Tracks `(event_id, handler_name)` pairs that completed successfully.
///
/// Each handler keeps its own record so two handlers may process the same
/// event independently.
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// True when `handler_name` has already finished this event.
    async fn contains(&self, event_id: &EventId, handler_name: &str) -> Result<bool, DomainError>;

    /// Records a successful handling. Call only after the handler returned `Ok`.
    async fn mark_processed(&self, event_id: &EventId, handler_name: &str)
        -> Result<(), DomainError>;

    /// Drops records older than `timestamp`, returning how many were removed.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
