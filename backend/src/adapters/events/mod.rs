//! Event transport adapters.
//!
//! - `InMemoryEventBus` - Synchronous, in-process bus for tests and local runs
//! - `IdempotentHandler` - Skips events a handler already processed
//! - `RedisStreamPublisher` - Appends outbound events to Redis streams
//! - `StreamConsumer` - Background reader for inbound drift triggers and observations

mod idempotent_handler;
mod in_memory;
mod redis_stream;
mod stream_consumer;

pub use idempotent_handler::IdempotentHandler;
pub use in_memory::InMemoryEventBus;
pub use redis_stream::{RedisStreamPublisher, StreamRouting};
pub use stream_consumer::{StreamConsumer, StreamConsumerConfig, DRIFT_DETECTED};
