//! Runtime value type exchanged between compiled instructions.

use bytes::Bytes;
use derive_more::From;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value flowing along the edges of a compiled pipeline.
///
/// Instructions accept zero or more values and produce exactly one.
/// Actor payloads travel as [`Value::Json`], serialized actor state as
/// [`Value::Bytes`], staged state identifiers as [`Value::Id`] and
/// multi-output results as [`Value::Sequence`].
///
/// Values serialize losslessly so instruction results can be relocated
/// across process boundaries by an external runner.
#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent result, e.g. a loader hitting a first-ever generation.
    Null,
    /// Opaque byte payload (serialized actor state).
    Bytes(Bytes),
    /// Structured data payload produced or consumed by an actor.
    Json(serde_json::Value),
    /// Ordered multi-output result, unwrapped element-wise by getters.
    Sequence(Vec<Value>),
    /// Identifier of a staged state blob.
    Id(Uuid),
}

impl Value {
    /// Returns whether this value is the null value.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the byte payload, if this value carries one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the structured payload, if this value carries one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    /// Returns the sequence elements, if this value is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the state identifier, if this value carries one.
    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let bytes = Value::Bytes(Bytes::from_static(b"state"));
        assert_eq!(bytes.as_bytes().unwrap().as_ref(), b"state");
        assert!(bytes.as_json().is_none());

        let seq = Value::Sequence(vec![Value::Null, bytes.clone()]);
        assert_eq!(seq.as_sequence().unwrap().len(), 2);

        assert!(Value::Null.is_null());
        assert!(!bytes.is_null());
    }

    #[test]
    fn test_value_round_trip() {
        let value = Value::Sequence(vec![
            Value::Json(serde_json::json!({"rows": 3})),
            Value::Id(Uuid::from_u128(7)),
            Value::Null,
        ]);
        let encoded = serde_json::to_vec(&value).unwrap();
        let decoded: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, value);
    }
}
