//! Profile catalog module.
//!
//! The catalog is a small, immutable set of predefined profiles loaded
//! once at startup, either from the built-in YAML or a configured file.

#[allow(clippy::module_inception)]
mod catalog;
mod profile;

pub use catalog::{CatalogError, ProfileCatalog};
pub use profile::{BehaviorLevel, Profile, ProfileDefinition};
