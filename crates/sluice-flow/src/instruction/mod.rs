//! The executable instruction vocabulary.
//!
//! Each instruction is a pure, replayable unit of work: given zero or more
//! argument values it produces exactly one result value, with no ordering
//! dependency on anything but its declared arguments. Instructions carry
//! declarative descriptions (actor specs, group identities, port indices)
//! rather than live closures, so a runner may relocate them to another
//! process and re-derive their resources there.

use async_trait::async_trait;

use crate::error::FlowResult;
use sluice_core::Value;

mod committer;
mod dumper;
mod functor;
mod getter;
mod loader;

pub use committer::Committer;
pub use dumper::Dumper;
pub use functor::{Functor, Objective};
pub use getter::Getter;
pub use loader::Loader;

/// A single executable unit of a compiled flow.
///
/// The contract imposed on any runner: all arguments are fully evaluated
/// before the instruction is invoked, and each instruction of a compiled
/// sequence is invoked exactly once.
#[async_trait]
pub trait Instruction: Send + Sync + std::fmt::Debug {
    /// Short name identifying the instruction kind.
    fn mnemonic(&self) -> &'static str;

    /// Declared number of arguments, or `None` when variadic.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Executes the instruction on its evaluated arguments.
    async fn invoke(&self, args: Vec<Value>) -> FlowResult<Value>;
}
