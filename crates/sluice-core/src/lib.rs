#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod actor;
mod error;
mod registry;
mod value;

#[doc(hidden)]
pub mod prelude;

pub use actor::{Actor, ActorSpec};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use registry::{ActorFactory, ActorRegistry};
pub use value::Value;

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "sluice_core";
