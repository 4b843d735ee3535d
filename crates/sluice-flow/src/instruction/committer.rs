//! Generation committer instruction.

use std::sync::Arc;

use async_trait::async_trait;

use super::Instruction;
use crate::TRACING_TARGET;
use crate::error::{FlowError, FlowResult};
use sluice_assets::{StateAccessor, StateId};
use sluice_core::Value;

/// Seals the staged states of a training run as the next generation.
///
/// The only multi-arity instruction with a side effect: it receives the
/// dumped state identifiers at the exact accessor-defined group offsets and
/// must be invoked exactly once per compiled sequence, after all dumpers
/// feeding it.
pub struct Committer {
    accessor: Arc<StateAccessor>,
}

impl Committer {
    /// Creates a committer over the given accessor.
    pub fn new(accessor: Arc<StateAccessor>) -> Self {
        Self { accessor }
    }
}

#[async_trait]
impl Instruction for Committer {
    fn mnemonic(&self) -> &'static str {
        "committer"
    }

    async fn invoke(&self, args: Vec<Value>) -> FlowResult<Value> {
        let mut states = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Value::Id(id) => states.push(StateId::from_uuid(id)),
                other => return Err(FlowError::type_mismatch("id", &other)),
            }
        }

        let generation = self.accessor.commit(states).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            generation = %generation,
            "Training run committed"
        );

        Ok(Value::Null)
    }
}

impl std::fmt::Debug for Committer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committer").finish_non_exhaustive()
    }
}
