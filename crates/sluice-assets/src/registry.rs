//! Registry provider contract.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AssetResult;
use crate::key::{GenerationKey, ProjectKey, ReleaseKey, StateId};
use crate::listing::Listing;
use crate::package::Package;
use crate::tag::Tag;

/// Storage provider interface for the versioned asset registry.
///
/// Implementations back the Project → Release → Generation hierarchy with a
/// concrete medium (filesystem, object store, in-memory). The provider
/// raises the most specific error it can; translating storage absence into
/// level semantics is the responsibility of the [`crate::Directory`] layer.
///
/// Committed generations are immutable, so concurrent readers are always
/// safe. Staged state writes are keyed by random identifiers and never
/// conflict; the atomic [`Registry::close`] is the only serialization point,
/// and single-writer-per-release semantics are assumed for it.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Lists all projects in the store.
    async fn projects(&self) -> AssetResult<Listing<ProjectKey>>;

    /// Lists all releases of a project.
    async fn releases(&self, project: &ProjectKey) -> AssetResult<Listing<ReleaseKey>>;

    /// Lists all committed generations of a release.
    async fn generations(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
    ) -> AssetResult<Listing<GenerationKey>>;

    /// Pulls the package artifact of a release.
    async fn pull(&self, project: &ProjectKey, release: &ReleaseKey) -> AssetResult<Package>;

    /// Pushes a package artifact, creating its release level.
    async fn push(&self, package: Package) -> AssetResult<()>;

    /// Reads a state blob of a committed generation.
    ///
    /// Returns empty bytes if the state is legitimately absent for an
    /// existing generation.
    async fn read(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
        state: StateId,
    ) -> AssetResult<Bytes>;

    /// Writes an unbound state blob into the release staging area.
    async fn write(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        state: StateId,
        data: Bytes,
    ) -> AssetResult<()>;

    /// Opens the tag of a committed generation.
    async fn open(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
    ) -> AssetResult<Tag>;

    /// Atomically seals a generation with the given tag.
    ///
    /// Binds the staged states named by the tag to the generation and
    /// writes the tag last; an already sealed generation is rejected.
    async fn close(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
        tag: Tag,
    ) -> AssetResult<()>;
}
