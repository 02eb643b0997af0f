//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresAssignmentStore` - Versioned assignment and ranking state
//! - `PostgresExpertiseRepository` - Per-domain expertise confidence
//! - `PostgresProcessedEventStore` - Idempotency ledger for event handlers
//!
//! Schema lives in `backend/migrations/`.

mod assignment_store;
mod expertise_repository;
mod processed_event_store;

pub use assignment_store::PostgresAssignmentStore;
pub use expertise_repository::PostgresExpertiseRepository;
pub use processed_event_store::PostgresProcessedEventStore;
