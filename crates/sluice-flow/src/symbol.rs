//! Compiled symbols.

use std::sync::Arc;

use crate::instruction::Instruction;
use crate::table::InstructionKey;

/// One element of a compiled flow: an instruction paired with the ordered
/// keys of its upstream argument instructions.
///
/// The key is a bookkeeping handle only; once compiled, a runner resolves
/// the argument keys to instruction references up front and executes by
/// direct reference. Every argument key of a symbol sequence appears as the
/// key of exactly one other symbol, and the sequence is acyclic with exactly
/// one terminal symbol.
#[derive(Clone)]
pub struct Symbol {
    /// Bookkeeping handle of the instruction.
    pub key: InstructionKey,
    /// The executable instruction.
    pub instruction: Arc<dyn Instruction>,
    /// Ordered upstream argument instructions.
    pub arguments: Vec<InstructionKey>,
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol")
            .field("key", &self.key)
            .field("instruction", &self.instruction)
            .field("arguments", &self.arguments)
            .finish()
    }
}
