//! Multi-output item getter instruction.

use async_trait::async_trait;

use super::Instruction;
use crate::error::{FlowError, FlowResult};
use sluice_core::Value;

/// Extracts one element of a multi-output value sequence.
///
/// Getters decouple subscribers from ambiguous multi-valued outputs: each
/// output slot of a multi-output node gets its own getter, and subscribers
/// bind to the getter rather than to the producing functor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Getter {
    index: usize,
}

impl Getter {
    /// Creates a getter for the given output slot.
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// Returns the output slot this getter extracts.
    pub const fn index(&self) -> usize {
        self.index
    }
}

#[async_trait]
impl Instruction for Getter {
    fn mnemonic(&self) -> &'static str {
        "getter"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    async fn invoke(&self, mut args: Vec<Value>) -> FlowResult<Value> {
        let sequence = match args.pop() {
            Some(Value::Sequence(items)) if args.is_empty() => items,
            Some(other) if args.is_empty() => {
                return Err(FlowError::type_mismatch("sequence", &other));
            }
            _ => {
                return Err(FlowError::Internal(
                    "getter takes exactly one argument".into(),
                ));
            }
        };

        sequence.into_iter().nth(self.index).ok_or_else(|| {
            FlowError::Internal(format!("output slot {} out of bounds", self.index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_getter_extracts_slot() {
        let getter = Getter::new(1);
        let sequence = Value::Sequence(vec![
            Value::Json(serde_json::json!("a")),
            Value::Json(serde_json::json!("b")),
        ]);
        let result = getter.invoke(vec![sequence]).await.unwrap();
        assert_eq!(result, Value::Json(serde_json::json!("b")));
    }

    #[tokio::test]
    async fn test_getter_rejects_scalars() {
        let getter = Getter::new(0);
        let result = getter.invoke(vec![Value::Null]).await;
        assert!(matches!(result, Err(FlowError::TypeMismatch { .. })));
    }
}
