#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod compiler;
mod error;
pub mod instruction;
mod node;
mod runner;
mod symbol;
mod table;

#[doc(hidden)]
pub mod prelude;

pub use compiler::Compiler;
pub use error::{FlowError, FlowResult};
pub use node::{Node, NodeId, Subscription};
pub use runner::{Interpreter, Runner, RunnerConfig, RunnerConfigBuilder};
pub use symbol::Symbol;
pub use table::{InstructionKey, SlotKey, SymbolTable};

/// Tracing target for flow operations.
pub const TRACING_TARGET: &str = "sluice_flow";
