//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations, plus the
//! event handlers the stream consumers feed.

pub mod assignment;
pub mod expertise;

pub use assignment::*;
pub use expertise::*;
