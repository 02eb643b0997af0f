//! In-memory adapters.
//!
//! Process-local implementations of the state ports. Used by tests and by
//! the binary when no database is configured; nothing survives a restart.

mod assignment_store;
mod behavior_source;
mod expertise_repository;
mod processed_event_store;

pub use assignment_store::InMemoryAssignmentStore;
pub use behavior_source::InMemoryBehaviorSource;
pub use expertise_repository::InMemoryExpertiseRepository;
pub use processed_event_store::InMemoryProcessedEventStore;
