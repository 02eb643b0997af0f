//! Profile assignment module.
//!
//! # Module Structure
//!
//! - `mode` - ProfileMode state machine
//! - `user_state` - UserAssignmentState aggregate
//! - `policy` - assignment criteria and confidence bands
//! - `events` - events emitted on assignment and drift
//! - `errors` - AssignmentError

mod errors;
mod events;
mod mode;
mod policy;
mod user_state;

pub use errors::AssignmentError;
pub use events::{DriftFallbackEntered, ProfileAssigned, DRIFT_FALLBACK_ENTERED, PROFILE_ASSIGNED};
pub use mode::ProfileMode;
pub use policy::{AssignmentOutcome, AssignmentPolicy, ConfidenceLevel};
pub use user_state::UserAssignmentState;
