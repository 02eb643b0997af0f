//! Redis Streams event publisher.
//!
//! Each envelope becomes one stream entry with two fields:
//!
//! | Field | Content |
//! |-------|---------|
//! | `payload` | the event payload as JSON (what downstream consumers parse) |
//! | `envelope` | the full envelope as JSON, metadata included |
//!
//! `profile.assigned` events go to the assigned stream; everything else
//! goes to the general events stream.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::assignment::PROFILE_ASSIGNED;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Stream routing for [`RedisStreamPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRouting {
    pub assigned_stream: String,
    pub events_stream: String,
}

impl StreamRouting {
    pub fn new(assigned_stream: impl Into<String>, events_stream: impl Into<String>) -> Self {
        Self {
            assigned_stream: assigned_stream.into(),
            events_stream: events_stream.into(),
        }
    }

    /// Stream an envelope is appended to.
    pub fn stream_for(&self, envelope: &EventEnvelope) -> &str {
        if envelope.event_type == PROFILE_ASSIGNED {
            &self.assigned_stream
        } else {
            &self.events_stream
        }
    }
}

pub struct RedisStreamPublisher {
    conn: MultiplexedConnection,
    routing: StreamRouting,
}

impl RedisStreamPublisher {
    pub fn new(conn: MultiplexedConnection, routing: StreamRouting) -> Self {
        Self { conn, routing }
    }
}

fn entry_fields(envelope: &EventEnvelope) -> Result<[(&'static str, String); 2], DomainError> {
    let encode = |value: serde_json::Result<String>| {
        value.map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to encode {}: {}", envelope.event_type, e),
            )
        })
    };
    Ok([
        ("payload", encode(serde_json::to_string(&envelope.payload))?),
        ("envelope", encode(serde_json::to_string(envelope))?),
    ])
}

#[async_trait]
impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let stream = self.routing.stream_for(&event);
        let fields = entry_fields(&event)?;

        let mut conn = self.conn.clone();
        let entry_id: String = conn.xadd(stream, "*", &fields).await.map_err(
            |e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::CacheError,
                    format!("Failed to append {} to {}: {}", event.event_type, stream, e),
                )
            },
        )?;

        tracing::info!(
            stream,
            entry_id = %entry_id,
            event_type = %event.event_type,
            user_id = %event.aggregate_id,
            "published event"
        );
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}
