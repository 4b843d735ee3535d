//! Convenient re-exports for common use.

pub use crate::actor::{Actor, ActorSpec};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::registry::{ActorFactory, ActorRegistry};
pub use crate::value::Value;
