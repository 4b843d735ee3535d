#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod directory;
mod error;
mod key;
mod listing;
mod package;
mod registry;
mod state;
mod storage;
mod tag;

#[doc(hidden)]
pub mod prelude;

pub use directory::{Directory, Generation, Project, Release};
pub use error::{AssetError, AssetResult};
pub use key::{GenerationKey, GroupId, Level, ProjectKey, ReleaseKey, StateId};
pub use listing::Listing;
pub use package::Package;
pub use registry::Registry;
pub use state::StateAccessor;
pub use storage::StorageRegistry;
pub use tag::{Tag, Training, Tuning};

/// Tracing target for asset store operations.
pub const TRACING_TARGET: &str = "sluice_assets";
