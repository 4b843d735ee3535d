//! Release package artifacts.

use bytes::Bytes;

use crate::key::{ProjectKey, ReleaseKey};

/// An opaque release artifact pulled from or pushed to the registry.
///
/// The payload layout is owned by the packaging layer; the registry only
/// stores and addresses it by project and release.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// Project the package belongs to.
    pub project: ProjectKey,
    /// Release the package implements.
    pub release: ReleaseKey,
    /// Opaque package payload.
    pub content: Bytes,
}

impl Package {
    /// Creates a new package.
    pub fn new(project: ProjectKey, release: ReleaseKey, content: impl Into<Bytes>) -> Self {
        Self {
            project,
            release,
            content: content.into(),
        }
    }
}
