//! EventSubscriber port - inbound event dispatch.
//!
//! Drift triggers and other inbound feeds are routed to handlers by event
//! type. Transports (in-memory bus, Redis stream consumer) only need to
//! find the right handler and call it.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing domain events.
///
/// Handlers must tolerate redelivery. Returning an error tells the
/// transport the event was not processed and may be retried.
///
/// # Example
///
/// ```ignore
/// #[async_trait]
/// impl EventHandler for DriftTriggerHandler {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let trigger: DriftTrigger = event.payload_as()?;
///         // ...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "DriftTriggerHandler"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name, used for logging and as the idempotency key namespace.
    fn name(&self) -> &'static str;
}

/// Port for subscribing handlers to event types.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Subscribe handler to multiple event types.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

/// Combined publish/subscribe capability.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn EventHandler) {}

    #[allow(dead_code)]
    fn assert_subscriber_object_safe(_: &dyn EventSubscriber) {}
}
