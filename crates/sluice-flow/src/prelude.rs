//! Prelude module for convenient imports.

pub use crate::compiler::Compiler;
pub use crate::error::{FlowError, FlowResult};
pub use crate::instruction::{Committer, Dumper, Functor, Getter, Instruction, Loader};
pub use crate::node::{Node, NodeId, Subscription};
pub use crate::runner::{Interpreter, Runner, RunnerConfig};
pub use crate::symbol::Symbol;
pub use crate::table::{InstructionKey, SlotKey, SymbolTable};
