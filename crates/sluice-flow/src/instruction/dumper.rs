//! State dumper instruction.

use std::sync::Arc;

use async_trait::async_trait;

use super::Instruction;
use crate::error::{FlowError, FlowResult};
use sluice_assets::StateAccessor;
use sluice_core::Value;

/// Stages a freshly trained state blob, producing its anonymous identifier.
///
/// The identifier only becomes part of a durable generation once the
/// committer references it.
pub struct Dumper {
    accessor: Arc<StateAccessor>,
}

impl Dumper {
    /// Creates a dumper over the given accessor.
    pub fn new(accessor: Arc<StateAccessor>) -> Self {
        Self { accessor }
    }
}

#[async_trait]
impl Instruction for Dumper {
    fn mnemonic(&self) -> &'static str {
        "dumper"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    async fn invoke(&self, mut args: Vec<Value>) -> FlowResult<Value> {
        let state = match args.pop() {
            Some(Value::Bytes(state)) if args.is_empty() => state,
            Some(other) if args.is_empty() => {
                return Err(FlowError::type_mismatch("bytes", &other));
            }
            _ => {
                return Err(FlowError::Internal(
                    "dumper takes exactly one argument".into(),
                ));
            }
        };

        let id = self.accessor.dump(state).await?;
        Ok(Value::Id(id.as_uuid()))
    }
}

impl std::fmt::Debug for Dumper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dumper").finish_non_exhaustive()
    }
}
