//! The immutable profile catalog.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::profile::{Profile, ProfileDefinition};
use crate::domain::foundation::{ProfileId, ValidationError};

const BUILTIN_CATALOG: &str = include_str!("profiles.yaml");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid profile: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Catalog contains no profiles")]
    Empty,

    #[error("Duplicate profile id: {0}")]
    Duplicate(ProfileId),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    profiles: Vec<ProfileDefinition>,
}

/// Read-only, validated set of profiles keyed by ID.
///
/// Iteration order is ascending by profile ID, which keeps scoring
/// deterministic.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: BTreeMap<ProfileId, Profile>,
}

impl ProfileCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Loads and validates a catalog from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(raw)?;
        Self::from_definitions(file.profiles)
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ProfileDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut profiles = BTreeMap::new();
        for def in definitions {
            let profile = Profile::try_from(def)?;
            let id = profile.id().clone();
            if profiles.insert(id.clone(), profile).is_some() {
                return Err(CatalogError::Duplicate(id));
            }
        }
        if profiles.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn contains(&self, id: &ProfileId) -> bool {
        self.profiles.contains_key(id)
    }

    /// Profiles in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProfileId> {
        self.profiles.keys()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_has_six_profiles() {
        let catalog = ProfileCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 6);
        let ids: Vec<&str> = catalog.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3", "P4", "P5", "P6"]);
    }

    #[test]
    fn builtin_profiles_name_their_primary_intents() {
        let catalog = ProfileCatalog::builtin().unwrap();
        let p3 = catalog.get(&ProfileId::new("P3").unwrap()).unwrap();
        assert_eq!(p3.name(), "Technical Problem Solver");
        assert_eq!(p3.primary_intent(), "PROBLEM_SOLVING");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = r#"
profiles:
  - id: A
    name: First
    primary_intent: X
    intents: { X: 0.5 }
    behavior_levels: [BASIC]
  - id: A
    name: Second
    primary_intent: X
    intents: { X: 0.5 }
    behavior_levels: [BASIC]
"#;
        assert!(matches!(
            ProfileCatalog::from_yaml_str(yaml),
            Err(CatalogError::Duplicate(_))
        ));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            ProfileCatalog::from_yaml_str("profiles: []"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn invalid_weight_surfaces_validation_error() {
        let yaml = r#"
profiles:
  - id: A
    name: Broken
    primary_intent: X
    intents: { X: 1.2 }
    behavior_levels: [BASIC]
"#;
        assert!(matches!(
            ProfileCatalog::from_yaml_str(yaml),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn loads_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "profiles:\n  - id: Z1\n    name: Solo\n    primary_intent: X\n    intents: {{ X: 1.0 }}\n    behavior_levels: [ADVANCED]\n"
        )
        .unwrap();

        let catalog = ProfileCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
