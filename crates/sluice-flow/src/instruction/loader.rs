//! State loader instruction.

use std::sync::Arc;

use async_trait::async_trait;

use super::Instruction;
use crate::TRACING_TARGET;
use crate::error::{FlowError, FlowResult};
use sluice_assets::{GroupId, StateAccessor};
use sluice_core::Value;

/// Loads the persisted state of one node group from the base generation.
///
/// One loader exists per group, shared by all replicas. Absent state on a
/// first-ever generation yields [`Value::Null`] rather than failing the
/// pipeline.
pub struct Loader {
    accessor: Arc<StateAccessor>,
    group: GroupId,
}

impl Loader {
    /// Creates a loader for the given node group.
    pub fn new(accessor: Arc<StateAccessor>, group: GroupId) -> Self {
        Self { accessor, group }
    }

    /// Returns the group this loader serves.
    pub const fn group(&self) -> GroupId {
        self.group
    }
}

#[async_trait]
impl Instruction for Loader {
    fn mnemonic(&self) -> &'static str {
        "loader"
    }

    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    async fn invoke(&self, args: Vec<Value>) -> FlowResult<Value> {
        if !args.is_empty() {
            return Err(FlowError::Internal(format!(
                "loader takes no arguments, got {}",
                args.len()
            )));
        }

        let state = self.accessor.load(self.group).await?;
        if state.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                group = %self.group,
                "No persisted state, loading absent"
            );
            return Ok(Value::Null);
        }

        Ok(Value::Bytes(state))
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").field("group", &self.group).finish()
    }
}
