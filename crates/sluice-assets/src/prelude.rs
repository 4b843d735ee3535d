//! Prelude module for convenient imports.

pub use crate::directory::{Directory, Generation, Project, Release};
pub use crate::error::{AssetError, AssetResult};
pub use crate::key::{GenerationKey, GroupId, Level, ProjectKey, ReleaseKey, StateId};
pub use crate::listing::Listing;
pub use crate::package::Package;
pub use crate::registry::Registry;
pub use crate::state::StateAccessor;
pub use crate::storage::StorageRegistry;
pub use crate::tag::{Tag, Training, Tuning};
