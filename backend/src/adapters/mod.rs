//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - Event transports (in-memory bus, Redis streams)
//! - `memory` - In-process state stores for tests and local runs
//! - `postgres` - PostgreSQL persistence
//! - `intake` - Recent-behavior source over HTTP

pub mod events;
pub mod intake;
pub mod memory;
pub mod postgres;

pub use events::{
    IdempotentHandler, InMemoryEventBus, RedisStreamPublisher, StreamConsumer,
    StreamConsumerConfig, StreamRouting, DRIFT_DETECTED,
};
pub use intake::{HttpBehaviorSource, HttpBehaviorSourceConfig};
pub use memory::{
    InMemoryAssignmentStore, InMemoryBehaviorSource, InMemoryExpertiseRepository,
    InMemoryProcessedEventStore,
};
pub use postgres::{
    PostgresAssignmentStore, PostgresExpertiseRepository, PostgresProcessedEventStore,
};
