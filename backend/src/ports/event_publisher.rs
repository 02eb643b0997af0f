//! EventPublisher port - outbound domain events.
//!
//! The assignment engine announces assignments and drift transitions
//! without knowing whether they land on an in-memory bus or a Redis stream.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Delivery is at-least-once; consumers deduplicate on the envelope's
/// event ID.
///
/// # Example
///
/// ```ignore
/// let envelope = EventEnvelope::from_event(&assigned)?;
/// publisher.publish(envelope).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events in order.
    ///
    /// Adapters without batch support publish sequentially and stop at the
    /// first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn event_publisher_is_send_sync() {
        #[allow(dead_code)]
        fn check<T: EventPublisher>() {
            assert_send_sync::<T>();
        }
    }
}
