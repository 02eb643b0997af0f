//! Command infrastructure for application handlers.
//!
//! `CommandMetadata` carries tracing and causation context through a
//! command so that every emitted event can be correlated with whatever
//! produced it (an intake message, a drift trigger, an admin call).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventEnvelope;

/// Metadata context for command handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Links related operations across one unit of work.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// ID of the event that caused this command, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    causation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,

    /// Origin of the command (e.g. "intake", "drift-trigger").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add causation ID.
    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.causation_id = Some(id.into());
        self
    }

    /// Builder: Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Stamps an outgoing envelope with this context.
    pub fn apply_to(&self, envelope: EventEnvelope) -> EventEnvelope {
        let mut envelope = envelope.with_correlation_id(self.correlation_id());
        if let Some(causation) = &self.causation_id {
            envelope = envelope.with_causation_id(causation.clone());
        }
        if let Some(trace) = &self.trace_id {
            envelope = envelope.with_trace_id(trace.clone());
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_sets_all_fields() {
        let metadata = CommandMetadata::new()
            .with_correlation_id("corr-123")
            .with_causation_id("drift-9")
            .with_trace_id("trace-456")
            .with_source("intake");

        assert_eq!(metadata.correlation_id(), "corr-123");
        assert_eq!(metadata.causation_id(), Some("drift-9"));
        assert_eq!(metadata.trace_id(), Some("trace-456"));
        assert_eq!(metadata.source(), Some("intake"));
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        assert!(!CommandMetadata::new().correlation_id().is_empty());
    }

    #[test]
    fn serialization_skips_none_fields() {
        let json = serde_json::to_string(&CommandMetadata::new().with_source("api")).unwrap();
        assert!(json.contains("source"));
        assert!(!json.contains("causation_id"));
    }

    #[test]
    fn apply_to_stamps_envelope_metadata() {
        let metadata = CommandMetadata::new()
            .with_correlation_id("c1")
            .with_causation_id("e0");
        let envelope = metadata.apply_to(EventEnvelope::test_fixture());

        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("c1"));
        assert_eq!(envelope.metadata.causation_id.as_deref(), Some("e0"));
        assert!(envelope.metadata.trace_id.is_none());
    }
}
