//! OpenDAL-backed registry provider.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::error::{AssetError, AssetResult};
use crate::key::{GenerationKey, Level, ProjectKey, ReleaseKey, StateId};
use crate::listing::Listing;
use crate::package::Package;
use crate::registry::Registry;
use crate::tag::Tag;

/// Name of the per-release staging directory for unbound states.
const STAGE_DIR: &str = ".stage";

/// File name of the serialized generation tag.
const TAG_FILE: &str = "tag.json";

/// File name of the release package artifact.
const PACKAGE_FILE: &str = "package.bin";

/// Extension of state blob files.
const STATE_EXT: &str = "bin";

/// Registry provider backed by an OpenDAL operator.
///
/// Lays the hierarchy out as
/// `<project>/<release>/<generation>/tag.json` plus
/// `<generation>/<state-id>.bin`, with unbound states staged under
/// `<release>/.stage/`. Any OpenDAL service yields a working registry; the
/// filesystem and in-memory services are wired up as convenience
/// constructors.
#[derive(Clone)]
pub struct StorageRegistry {
    operator: Operator,
}

impl StorageRegistry {
    /// Creates a registry over an existing operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Creates a registry rooted at a local filesystem directory.
    pub fn filesystem(root: impl AsRef<str>) -> AssetResult<Self> {
        let builder = services::Fs::default().root(root.as_ref());
        let operator = Operator::new(builder)?.finish();

        tracing::info!(
            target: TRACING_TARGET,
            root = %root.as_ref(),
            "Filesystem registry initialized"
        );

        Ok(Self::new(operator))
    }

    /// Creates a volatile in-memory registry.
    pub fn memory() -> AssetResult<Self> {
        let operator = Operator::new(services::Memory::default())?.finish();
        Ok(Self::new(operator))
    }

    fn release_dir(project: &ProjectKey, release: &ReleaseKey) -> String {
        format!("{project}/{release}")
    }

    fn generation_dir(
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
    ) -> String {
        format!("{project}/{release}/{generation}")
    }

    fn tag_path(project: &ProjectKey, release: &ReleaseKey, generation: GenerationKey) -> String {
        format!("{project}/{release}/{generation}/{TAG_FILE}")
    }

    fn package_path(project: &ProjectKey, release: &ReleaseKey) -> String {
        format!("{project}/{release}/{PACKAGE_FILE}")
    }

    fn state_path(
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
        state: StateId,
    ) -> String {
        format!("{project}/{release}/{generation}/{state}.{STATE_EXT}")
    }

    fn stage_path(project: &ProjectKey, release: &ReleaseKey, state: StateId) -> String {
        format!("{project}/{release}/{STAGE_DIR}/{state}.{STATE_EXT}")
    }

    /// Lists the entry names directly under a directory.
    ///
    /// Names are returned without the trailing separator; entries that do
    /// not belong to the hierarchy (staging, packages, tags) are left to the
    /// caller's key parser to reject.
    async fn entries(&self, dir: &str) -> AssetResult<Vec<String>> {
        let entries: Vec<_> = match self.operator.lister(dir).await {
            Ok(lister) => lister.try_collect().await?,
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(entries
            .into_iter()
            .filter(|entry| entry.path() != dir)
            .map(|entry| entry.name().trim_end_matches('/').to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }
}

#[async_trait]
impl Registry for StorageRegistry {
    async fn projects(&self) -> AssetResult<Listing<ProjectKey>> {
        let names = self.entries("/").await?;
        Ok(names
            .into_iter()
            .filter_map(|name| name.parse::<ProjectKey>().ok())
            .collect())
    }

    async fn releases(&self, project: &ProjectKey) -> AssetResult<Listing<ReleaseKey>> {
        let names = self.entries(&format!("{project}/")).await?;
        Ok(names
            .into_iter()
            .filter_map(|name| name.parse::<ReleaseKey>().ok())
            .collect())
    }

    async fn generations(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
    ) -> AssetResult<Listing<GenerationKey>> {
        let dir = format!("{}/", Self::release_dir(project, release));
        let names = self.entries(&dir).await?;
        Ok(names
            .into_iter()
            .filter_map(|name| name.parse::<GenerationKey>().ok())
            .collect())
    }

    async fn pull(&self, project: &ProjectKey, release: &ReleaseKey) -> AssetResult<Package> {
        let path = Self::package_path(project, release);
        let content = self.operator.read(&path).await?.to_bytes();

        tracing::debug!(
            target: TRACING_TARGET,
            project = %project,
            release = %release,
            size = content.len(),
            "Package pulled"
        );

        Ok(Package::new(project.clone(), release.clone(), content))
    }

    async fn push(&self, package: Package) -> AssetResult<()> {
        let path = Self::package_path(&package.project, &package.release);
        if self.operator.exists(&path).await? {
            return Err(AssetError::invalid_level(Level::Release, &package.release));
        }

        self.operator
            .write(&path, package.content.clone())
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            project = %package.project,
            release = %package.release,
            size = package.content.len(),
            "Package pushed"
        );

        Ok(())
    }

    async fn read(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
        state: StateId,
    ) -> AssetResult<Bytes> {
        let path = Self::state_path(project, release, generation, state);
        match self.operator.read(&path).await {
            Ok(buffer) => Ok(buffer.to_bytes()),
            // A state can be legitimately absent for an existing generation.
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Ok(Bytes::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        state: StateId,
        data: Bytes,
    ) -> AssetResult<()> {
        let path = Self::stage_path(project, release, state);

        tracing::debug!(
            target: TRACING_TARGET,
            project = %project,
            release = %release,
            state = %state,
            size = data.len(),
            "Staging state blob"
        );

        self.operator.write(&path, data).await?;
        Ok(())
    }

    async fn open(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
    ) -> AssetResult<Tag> {
        let path = Self::tag_path(project, release, generation);
        let data = self.operator.read(&path).await?.to_bytes();
        Tag::loads(&data)
    }

    async fn close(
        &self,
        project: &ProjectKey,
        release: &ReleaseKey,
        generation: GenerationKey,
        tag: Tag,
    ) -> AssetResult<()> {
        let tag_path = Self::tag_path(project, release, generation);
        if self.operator.exists(&tag_path).await? {
            return Err(AssetError::GenerationSealed { key: generation });
        }

        // Bind the staged states named by the tag, then write the tag last
        // so a generation is visible only once fully sealed. States never
        // staged are tolerated; they read back as empty.
        for state in &tag.states {
            let staged = Self::stage_path(project, release, *state);
            match self.operator.read(&staged).await {
                Ok(buffer) => {
                    let bound = Self::state_path(project, release, generation, *state);
                    self.operator.write(&bound, buffer.to_bytes()).await?;
                }
                Err(err) if err.kind() == opendal::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        self.operator.write(&tag_path, tag.dumps()?).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            project = %project,
            release = %release,
            generation = %generation,
            states = tag.states.len(),
            "Generation sealed"
        );

        Ok(())
    }
}

impl std::fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRegistry")
            .field("scheme", &self.operator.info().scheme())
            .finish()
    }
}
