//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events
//! - `ProcessedEventStore` - Idempotency tracking for event handlers
//!
//! ## State Ports
//!
//! - `AssignmentStore` - Versioned per-user assignment and ranking state
//! - `ExpertiseRepository` - Per-domain expertise confidence
//!
//! ## Intake Ports
//!
//! - `RecentBehaviorSource` - Recent observations for drift re-evaluation

mod assignment_store;
mod event_publisher;
mod event_subscriber;
mod expertise_repository;
mod processed_event_store;
mod recent_behavior_source;

pub use assignment_store::{AssignmentSnapshot, AssignmentStore};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use expertise_repository::ExpertiseRepository;
pub use processed_event_store::ProcessedEventStore;
pub use recent_behavior_source::RecentBehaviorSource;
