//! Flow error types.

use thiserror::Error;

use crate::node::NodeId;
use crate::table::InstructionKey;
use sluice_assets::GroupId;

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur during flow compilation and execution.
///
/// The structural variants are programming or configuration errors: they
/// indicate a malformed graph or a registry/graph mismatch and abort
/// compilation rather than being tolerated.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A node identity appeared more than once in the path.
    #[error("node collision: {uid}")]
    NodeCollision {
        /// Identity of the duplicated node.
        uid: NodeId,
    },

    /// An instruction has an unlinked argument slot.
    #[error("dangling argument slot {slot} of instruction {key}")]
    DanglingArgument {
        /// Key of the instruction with the unlinked slot.
        key: InstructionKey,
        /// Index of the unlinked slot.
        slot: usize,
    },

    /// An instruction received arguments not matching its declared arity.
    #[error("instruction {key} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Key of the offending instruction.
        key: InstructionKey,
        /// Declared arity.
        expected: usize,
        /// Number of arguments actually linked.
        actual: usize,
    },

    /// The compiled symbol sequence contains a cycle.
    #[error("flow graph contains a cycle")]
    CyclicFlow,

    /// The compiled symbol sequence has more than one terminal instruction.
    #[error("flow graph has {count} terminal instructions, expected exactly one")]
    MultipleOutputs {
        /// Number of terminal instructions found.
        count: usize,
    },

    /// A stateful node has neither a persisted prior state nor a training
    /// replica.
    #[error("non-persistent stateful node without training: {uid}")]
    NonPersistentStateful {
        /// Identity of the offending node.
        uid: NodeId,
    },

    /// A node group is expected to persist state but is unknown to the
    /// accessor.
    #[error("node group not tracked by the state accessor: {group}")]
    UntrackedGroup {
        /// The unknown group identity.
        group: GroupId,
    },

    /// A subscription references a node missing from the path.
    #[error("subscription references unknown node: {uid}")]
    UnknownSubscriber {
        /// Identity of the missing node.
        uid: NodeId,
    },

    /// An instruction received a value of an unexpected shape.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected value shape.
        expected: &'static str,
        /// Actual value shape.
        actual: &'static str,
    },

    /// Instruction execution exceeded the configured timeout.
    #[error("flow execution timed out")]
    Timeout,

    /// Actor instantiation or invocation failed.
    #[error("actor error: {0}")]
    Actor(#[from] sluice_core::Error),

    /// Asset store operation failed.
    #[error("asset error: {0}")]
    Asset(#[from] sluice_assets::AssetError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Creates a type mismatch error from an actual value.
    pub fn type_mismatch(expected: &'static str, actual: &sluice_core::Value) -> Self {
        use sluice_core::Value;

        let actual = match actual {
            Value::Null => "null",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Sequence(_) => "sequence",
            Value::Id(_) => "id",
        };
        Self::TypeMismatch { expected, actual }
    }
}
