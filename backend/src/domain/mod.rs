//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, events, errors)
//! - `catalog` - The static set of predefined profiles
//! - `matching` - Scoring an observation against every profile
//! - `ranking` - Per-(user, profile) running ranking state and analytics
//! - `assignment` - Assignment mode state machine, policy and events
//! - `drift` - Drift severity classification
//! - `features` - Complexity, consistency and expertise extractors

pub mod assignment;
pub mod catalog;
pub mod drift;
pub mod features;
pub mod foundation;
pub mod matching;
pub mod ranking;
