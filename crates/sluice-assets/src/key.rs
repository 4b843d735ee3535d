//! Ordered key types for the registry hierarchy.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssetError;

/// Levels of the registry hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Top-level project namespace.
    Project,
    /// Versioned code lineage within a project.
    Release,
    /// Committed state snapshot within a release.
    Generation,
}

/// Opaque string identifier of a project, unique within the store.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Creates a project key, validating it is usable as a path segment.
    pub fn new(key: impl Into<String>) -> Result<Self, AssetError> {
        let key = key.into();
        if key.is_empty() || key.starts_with('.') || key.contains('/') {
            return Err(AssetError::invalid_level(Level::Project, &key));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProjectKey {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Version token identifying a release, ordered by semantic version rules.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct ReleaseKey(semver::Version);

impl ReleaseKey {
    /// Creates a release key from a semantic version.
    pub const fn new(version: semver::Version) -> Self {
        Self(version)
    }

    /// Returns the underlying version.
    pub const fn as_version(&self) -> &semver::Version {
        &self.0
    }
}

impl FromStr for ReleaseKey {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        semver::Version::parse(s)
            .map(Self)
            .map_err(|_| AssetError::invalid_level(Level::Release, s))
    }
}

/// Strictly positive, auto-incrementing generation number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct GenerationKey(u64);

impl GenerationKey {
    /// The first generation of any release.
    pub const FIRST: Self = Self(1);

    /// Creates a generation key, rejecting the reserved zero value.
    pub fn new(key: u64) -> Result<Self, AssetError> {
        if key == 0 {
            return Err(AssetError::invalid_level(Level::Generation, key));
        }
        Ok(Self(key))
    }

    /// Returns the key following this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the numeric value of the key.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for GenerationKey {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: u64 = s
            .parse()
            .map_err(|_| AssetError::invalid_level(Level::Generation, s))?;
        Self::new(key)
    }
}

/// Identifier of a state blob, randomly assigned at dump time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct StateId(Uuid);

impl StateId {
    /// Creates a new random state identifier.
    #[inline]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a state identifier from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for StateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Identity shared by all physical replicas of one logical stateful unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Creates a new random group identity.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a group identity from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_key_validation() {
        assert!(ProjectKey::new("census").is_ok());
        assert!(ProjectKey::new("").is_err());
        assert!(ProjectKey::new(".stage").is_err());
        assert!(ProjectKey::new("a/b").is_err());
    }

    #[test]
    fn test_release_key_ordering() {
        let r1: ReleaseKey = "1.0.0".parse().unwrap();
        let r2: ReleaseKey = "1.0.1".parse().unwrap();
        let r10: ReleaseKey = "1.10.0".parse().unwrap();
        assert!(r1 < r2);
        assert!(r2 < r10);
        assert!("not-a-version".parse::<ReleaseKey>().is_err());
    }

    #[test]
    fn test_generation_key_increments() {
        assert!(GenerationKey::new(0).is_err());
        let first = GenerationKey::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.next().get(), 2);
        assert_eq!("3".parse::<GenerationKey>().unwrap().get(), 3);
        assert!("x".parse::<GenerationKey>().is_err());
    }

    #[test]
    fn test_state_id_parse_round_trip() {
        let id = StateId::generate();
        let parsed: StateId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
