//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers, events and error types that form the
//! vocabulary of the profile assignment domain.

mod command;
mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;
mod unit_score;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata};
pub use ids::{ProfileId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use unit_score::UnitScore;
