//! IdempotentHandler - skips events a handler has already finished.
//!
//! Wraps any `EventHandler` and consults a `ProcessedEventStore` keyed on
//! `(event_id, handler name)`. Drift triggers carry their upstream
//! `drift_event_id` as the envelope's event ID, so a redelivered trigger is
//! recognised and dropped.
//!
//! If the inner handler fails the event is not recorded, so the next
//! delivery retries it. Store failures propagate.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventHandler, ProcessedEventStore};

pub struct IdempotentHandler<H: EventHandler> {
    inner: H,
    processed_events: Arc<dyn ProcessedEventStore>,
}

impl<H: EventHandler> IdempotentHandler<H> {
    pub fn new(inner: H, processed_events: Arc<dyn ProcessedEventStore>) -> Self {
        Self {
            inner,
            processed_events,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: EventHandler + 'static> EventHandler for IdempotentHandler<H> {
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        let handler_name = self.inner.name();

        if self
            .processed_events
            .contains(&envelope.event_id, handler_name)
            .await?
        {
            tracing::debug!(
                event_id = %envelope.event_id,
                handler = handler_name,
                "skipping already processed event"
            );
            return Ok(());
        }

        let event_id = envelope.event_id.clone();
        self.inner.handle(envelope).await?;

        self.processed_events
            .mark_processed(&event_id, handler_name)
            .await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
