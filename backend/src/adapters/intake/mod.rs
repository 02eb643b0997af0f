//! Intake adapters - where recent behavior comes from.

mod http_behavior_source;

pub use http_behavior_source::{HttpBehaviorSource, HttpBehaviorSourceConfig};
