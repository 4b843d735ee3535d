//! Asset store error types.

use thiserror::Error;

use crate::key::{GenerationKey, GroupId, Level, ReleaseKey};

/// Result type for asset store operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors that can occur during asset store operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// A key is malformed or does not exist at its level.
    #[error("invalid {level} key: {key}")]
    InvalidLevel {
        /// The hierarchy level the key belongs to.
        level: Level,
        /// Textual form of the offending key.
        key: String,
    },

    /// A level has no entries where one was required.
    #[error("empty {level} listing")]
    EmptyLevel {
        /// The hierarchy level with no entries.
        level: Level,
    },

    /// A pushed release does not strictly increment the previous one.
    #[error("release {proposed} does not increment over {previous}")]
    NonIncrementingRelease {
        /// Highest release already present.
        previous: ReleaseKey,
        /// Release that was rejected.
        proposed: ReleaseKey,
    },

    /// A generation has already been sealed and cannot be replaced.
    #[error("generation {key} is already sealed")]
    GenerationSealed {
        /// Key of the sealed generation.
        key: GenerationKey,
    },

    /// The committed state count does not match the expected node groups.
    #[error("state count mismatch: expected {expected}, got {actual}")]
    StateCountMismatch {
        /// Number of persistent node groups the accessor expects.
        expected: usize,
        /// Number of states actually supplied.
        actual: usize,
    },

    /// A state group is not known to the accessor.
    #[error("unknown state group: {0}")]
    UnknownGroup(GroupId),

    /// Storage object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(opendal::Error),
}

impl AssetError {
    /// Creates a new invalid level error.
    pub fn invalid_level(level: Level, key: impl ToString) -> Self {
        Self::InvalidLevel {
            level,
            key: key.to_string(),
        }
    }

    /// Creates a new empty level error.
    pub fn empty_level(level: Level) -> Self {
        Self::EmptyLevel { level }
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Returns whether this error denotes a legitimately absent level.
    pub const fn is_empty_level(&self) -> bool {
        matches!(self, Self::EmptyLevel { .. })
    }

    /// Returns whether this error denotes a missing storage object.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<opendal::Error> for AssetError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Storage(err),
        }
    }
}
