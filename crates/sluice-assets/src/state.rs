//! Per-execution state accessor.

use std::sync::Arc;

use bytes::Bytes;

use crate::TRACING_TARGET;
use crate::directory::{Generation, Release};
use crate::error::{AssetError, AssetResult};
use crate::key::{GenerationKey, GroupId, ProjectKey, ReleaseKey, StateId};
use crate::registry::Registry;
use crate::tag::Tag;

/// Facade over one generation, driven by compiled pipeline instructions.
///
/// The accessor is constructed against a release, a base generation and the
/// ordered list of node groups expected to persist state. Loader
/// instructions call [`StateAccessor::load`], dumpers call
/// [`StateAccessor::dump`] and the single committer seals a new generation
/// via [`StateAccessor::commit`].
pub struct StateAccessor {
    registry: Arc<dyn Registry>,
    project: ProjectKey,
    release: ReleaseKey,
    generation: Generation,
    groups: Vec<GroupId>,
    template: Option<Tag>,
}

impl StateAccessor {
    /// Creates an accessor over a generation of the given release.
    ///
    /// With `generation` unset the base resolves lazily to the last
    /// committed generation; a release with no generations yet reads as the
    /// null tag. `template` overrides the tag the next commit is built
    /// from; by default the base generation's tag is reused.
    pub async fn new(
        release: &Release,
        generation: Option<GenerationKey>,
        groups: Vec<GroupId>,
        template: Option<Tag>,
    ) -> AssetResult<Self> {
        let registry = release.registry().clone();
        let project = release.project().clone();
        let generation = release.generation(generation).await?;
        let release = generation.release().clone();

        Ok(Self {
            registry,
            project,
            release,
            generation,
            groups,
            template,
        })
    }

    /// Returns the ordered node groups this accessor expects to persist.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Returns the positional offset of a group within the expected list.
    pub fn offset(&self, group: GroupId) -> AssetResult<usize> {
        self.groups
            .iter()
            .position(|candidate| *candidate == group)
            .ok_or(AssetError::UnknownGroup(group))
    }

    /// Loads the persisted state of a node group from the base generation.
    ///
    /// Returns empty bytes when no generation has been committed yet; a
    /// first-ever training run must not fail on absent state.
    pub async fn load(&self, group: GroupId) -> AssetResult<Bytes> {
        let offset = self.offset(group)?;
        let tag = self.generation.tag().await?;

        if tag.states.is_empty() {
            return Ok(Bytes::new());
        }
        if tag.states.len() != self.groups.len() {
            return Err(AssetError::StateCountMismatch {
                expected: self.groups.len(),
                actual: tag.states.len(),
            });
        }

        let state = tag.states[offset];

        tracing::debug!(
            target: TRACING_TARGET,
            group = %group,
            offset,
            state = %state,
            "Loading group state"
        );

        self.generation.read(state).await
    }

    /// Stages a freshly produced state blob, returning its identifier.
    ///
    /// Staged states are anonymous until a committed tag references them.
    pub async fn dump(&self, data: Bytes) -> AssetResult<StateId> {
        let state = StateId::generate();

        self.registry
            .write(&self.project, &self.release, state, data)
            .await?;

        Ok(state)
    }

    /// Commits the ordered staged states as the next generation.
    ///
    /// The state count must match the expected node groups exactly. The new
    /// tag is built by replacing the `states` field of the template tag
    /// (caller-supplied, or the base generation's tag) and sealed under the
    /// next dense generation key.
    pub async fn commit(&self, states: Vec<StateId>) -> AssetResult<GenerationKey> {
        if states.len() != self.groups.len() {
            return Err(AssetError::StateCountMismatch {
                expected: self.groups.len(),
                actual: states.len(),
            });
        }

        let template = match &self.template {
            Some(tag) => tag.clone(),
            None => self.generation.tag().await?,
        };
        let tag = template.with_states(states);

        let next = self
            .registry
            .generations(&self.project, &self.release)
            .await?
            .next();
        self.registry
            .close(&self.project, &self.release, next, tag)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            project = %self.project,
            release = %self.release,
            generation = %next,
            "Generation committed"
        );

        Ok(next)
    }
}

impl std::fmt::Debug for StateAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateAccessor")
            .field("project", &self.project)
            .field("release", &self.release)
            .field("groups", &self.groups.len())
            .finish()
    }
}
