//! Hierarchical directory view over a registry provider.
//!
//! The directory layer resolves level keys lazily (an unspecified key means
//! the *last* entry of the parent listing), translates storage absence into
//! level semantics and enforces the append-only invariants: strictly
//! increasing releases and dense, never-reused generation keys.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::OnceCell;

use crate::TRACING_TARGET;
use crate::error::{AssetError, AssetResult};
use crate::key::{GenerationKey, Level, ProjectKey, ReleaseKey, StateId};
use crate::listing::Listing;
use crate::package::Package;
use crate::registry::Registry;
use crate::tag::Tag;

/// Root handle over a registry provider.
#[derive(Clone)]
pub struct Directory {
    registry: Arc<dyn Registry>,
}

impl Directory {
    /// Creates a directory over the given registry provider.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Lists all projects in the store.
    pub async fn projects(&self) -> AssetResult<Listing<ProjectKey>> {
        self.registry.projects().await
    }

    /// Returns a handle to the given project.
    pub fn project(&self, key: ProjectKey) -> Project {
        Project {
            registry: self.registry.clone(),
            key,
        }
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}

/// One project level of the directory.
#[derive(Clone)]
pub struct Project {
    registry: Arc<dyn Registry>,
    key: ProjectKey,
}

impl Project {
    /// Returns the project key.
    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    /// Lists all releases of this project.
    pub async fn releases(&self) -> AssetResult<Listing<ReleaseKey>> {
        self.registry.releases(&self.key).await
    }

    /// Returns a handle to a release of this project.
    ///
    /// With `None` the key resolves lazily to the last (greatest) release.
    pub fn release(&self, key: Option<ReleaseKey>) -> Release {
        Release {
            registry: self.registry.clone(),
            project: self.key.clone(),
            requested: key,
            resolved: OnceCell::new(),
        }
    }

    /// Publishes a new release of this project.
    ///
    /// The release must compare strictly greater than every existing
    /// release of the project.
    pub async fn publish(&self, key: ReleaseKey, content: Bytes) -> AssetResult<Release> {
        let releases = self.releases().await?;
        if let Some(previous) = releases.last() {
            if key <= *previous {
                return Err(AssetError::NonIncrementingRelease {
                    previous: previous.clone(),
                    proposed: key,
                });
            }
        }

        self.registry
            .push(Package::new(self.key.clone(), key.clone(), content))
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            project = %self.key,
            release = %key,
            "Release published"
        );

        Ok(Release {
            registry: self.registry.clone(),
            project: self.key.clone(),
            requested: Some(key.clone()),
            resolved: OnceCell::new_with(Some(key)),
        })
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project").field("key", &self.key).finish()
    }
}

/// One release level of the directory, with lazy key resolution.
pub struct Release {
    registry: Arc<dyn Registry>,
    project: ProjectKey,
    requested: Option<ReleaseKey>,
    resolved: OnceCell<ReleaseKey>,
}

impl Release {
    /// Returns the project key this release belongs to.
    pub fn project(&self) -> &ProjectKey {
        &self.project
    }

    pub(crate) fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Resolves and returns the release key.
    ///
    /// An explicitly requested key must exist in the listing; an
    /// unspecified key resolves to the last entry, and resolving against an
    /// empty listing is reported as [`AssetError::EmptyLevel`].
    pub async fn key(&self) -> AssetResult<&ReleaseKey> {
        self.resolved
            .get_or_try_init(|| async {
                let listing = self.registry.releases(&self.project).await?;
                match &self.requested {
                    Some(key) if listing.contains(key) => Ok(key.clone()),
                    Some(key) => Err(AssetError::invalid_level(Level::Release, key)),
                    None => listing
                        .last()
                        .cloned()
                        .ok_or_else(|| AssetError::empty_level(Level::Release)),
                }
            })
            .await
    }

    /// Lists all committed generations of this release.
    pub async fn generations(&self) -> AssetResult<Listing<GenerationKey>> {
        let release = self.key().await?;
        self.registry.generations(&self.project, release).await
    }

    /// Pulls the package artifact of this release.
    pub async fn pull(&self) -> AssetResult<Package> {
        let release = self.key().await?;
        self.registry.pull(&self.project, release).await
    }

    /// Returns a handle to a generation of this release.
    ///
    /// With `None` the key resolves lazily to the last (greatest)
    /// committed generation.
    pub async fn generation(&self, key: Option<GenerationKey>) -> AssetResult<Generation> {
        let release = self.key().await?.clone();
        Ok(Generation {
            registry: self.registry.clone(),
            project: self.project.clone(),
            release,
            requested: key,
            resolved: OnceCell::new(),
            tag: OnceCell::new(),
        })
    }
}

impl Clone for Release {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            project: self.project.clone(),
            requested: self.requested.clone(),
            resolved: OnceCell::new_with(self.resolved.get().cloned()),
        }
    }
}

impl std::fmt::Debug for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("project", &self.project)
            .field("requested", &self.requested)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// One generation level of the directory, with lazy key resolution.
pub struct Generation {
    registry: Arc<dyn Registry>,
    project: ProjectKey,
    release: ReleaseKey,
    requested: Option<GenerationKey>,
    resolved: OnceCell<GenerationKey>,
    tag: OnceCell<Tag>,
}

impl Generation {
    /// Returns the release key this generation belongs to.
    pub fn release(&self) -> &ReleaseKey {
        &self.release
    }

    /// Resolves and returns the generation key.
    ///
    /// Same resolution rules as [`Release::key`]: explicit keys must exist,
    /// unspecified keys take the last entry, and an empty listing is the
    /// distinct [`AssetError::EmptyLevel`] condition.
    pub async fn key(&self) -> AssetResult<GenerationKey> {
        self.resolved
            .get_or_try_init(|| async {
                let listing = self
                    .registry
                    .generations(&self.project, &self.release)
                    .await?;
                match self.requested {
                    Some(key) if listing.contains(&key) => Ok(key),
                    Some(key) => Err(AssetError::invalid_level(Level::Generation, key)),
                    None => listing
                        .last()
                        .copied()
                        .ok_or_else(|| AssetError::empty_level(Level::Generation)),
                }
            })
            .await
            .copied()
    }

    /// Returns the tag of this generation.
    ///
    /// An empty generation listing yields the null tag rather than an
    /// error, so a release that was never trained reads as "no states".
    pub async fn tag(&self) -> AssetResult<Tag> {
        self.tag
            .get_or_try_init(|| async {
                match self.key().await {
                    Ok(key) => self.registry.open(&self.project, &self.release, key).await,
                    Err(err) if err.is_empty_level() => Ok(Tag::default()),
                    Err(err) => Err(err),
                }
            })
            .await
            .cloned()
    }

    /// Reads a state blob of this generation.
    ///
    /// An empty generation yields empty bytes; loading state that was
    /// never persisted must not fail the pipeline.
    pub async fn read(&self, state: StateId) -> AssetResult<Bytes> {
        match self.key().await {
            Ok(key) => {
                self.registry
                    .read(&self.project, &self.release, key, state)
                    .await
            }
            Err(err) if err.is_empty_level() => Ok(Bytes::new()),
            Err(err) => Err(err),
        }
    }
}

impl Clone for Generation {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            project: self.project.clone(),
            release: self.release.clone(),
            requested: self.requested,
            resolved: OnceCell::new_with(self.resolved.get().copied()),
            tag: OnceCell::new_with(self.tag.get().cloned()),
        }
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("project", &self.project)
            .field("release", &self.release)
            .field("requested", &self.requested)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageRegistry;

    fn directory() -> Directory {
        Directory::new(Arc::new(StorageRegistry::memory().unwrap()))
    }

    fn release_key(s: &str) -> ReleaseKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_publish_requires_strict_increment() {
        let directory = directory();
        let project = directory.project("census".parse().unwrap());

        project
            .publish(release_key("1.1.0"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        // Equal and smaller releases are both rejected.
        for stale in ["1.1.0", "1.0.9"] {
            let result = project
                .publish(release_key(stale), Bytes::from_static(b"b"))
                .await;
            assert!(matches!(
                result,
                Err(AssetError::NonIncrementingRelease { .. })
            ));
        }

        project
            .publish(release_key("1.2.0"), Bytes::from_static(b"c"))
            .await
            .unwrap();
        let releases = project.releases().await.unwrap();
        assert_eq!(releases.last(), Some(&release_key("1.2.0")));
    }

    #[tokio::test]
    async fn test_release_resolution() {
        let directory = directory();
        let project = directory.project("census".parse().unwrap());
        project
            .publish(release_key("1.0.0"), Bytes::from_static(b"a"))
            .await
            .unwrap();
        project
            .publish(release_key("2.0.0"), Bytes::from_static(b"b"))
            .await
            .unwrap();

        // Unspecified key resolves to the last release.
        let latest = project.release(None);
        assert_eq!(latest.key().await.unwrap(), &release_key("2.0.0"));

        // Explicit keys must exist.
        let invalid = project.release(Some(release_key("3.0.0")));
        assert!(matches!(
            invalid.key().await,
            Err(AssetError::InvalidLevel {
                level: Level::Release,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_listing_is_distinct_from_invalid() {
        let directory = directory();
        let project = directory.project("void".parse().unwrap());

        let latest = project.release(None);
        assert!(matches!(
            latest.key().await,
            Err(AssetError::EmptyLevel {
                level: Level::Release
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_generation_yields_null_tag() {
        let directory = directory();
        let project = directory.project("census".parse().unwrap());
        let release = project
            .publish(release_key("1.0.0"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        let generation = release.generation(None).await.unwrap();
        assert!(matches!(
            generation.key().await,
            Err(AssetError::EmptyLevel {
                level: Level::Generation
            })
        ));
        assert!(generation.tag().await.unwrap().is_null());
        assert!(
            generation
                .read(StateId::generate())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
