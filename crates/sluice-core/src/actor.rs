//! Actor contract and declarative actor specs.

use bytes::Bytes;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value::Value;

/// An opaque unit of computation wrapped by a pipeline node.
///
/// Actors are black boxes to the rest of the system: the compiler and the
/// instruction set only ever touch this interface. Stateless actors need to
/// implement [`Actor::apply`] only; the state methods default to the
/// stateless behavior (empty state, ignored restores, unsupported training).
pub trait Actor: Send {
    /// Applies the actor to the given inputs, producing one output.
    fn apply(&mut self, inputs: Vec<Value>) -> Result<Value>;

    /// Trains the actor on the given inputs, updating its internal state.
    fn train(&mut self, inputs: Vec<Value>) -> Result<()> {
        let _ = inputs;
        Err(crate::error::Error::unsupported().with_message("actor does not train"))
    }

    /// Returns the serialized internal state of the actor.
    fn get_state(&self) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    /// Restores the actor's internal state from a serialized payload.
    fn set_state(&mut self, state: Bytes) -> Result<()> {
        let _ = state;
        Ok(())
    }
}

/// Declarative description of an actor instance.
///
/// A spec names a registered factory and carries its constructor parameters.
/// Instructions hold specs rather than live actors so they can be shipped to
/// another process and re-derived there; the actor itself is instantiated
/// lazily on first invocation.
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
#[display("{factory}({params})")]
pub struct ActorSpec {
    /// Alias of the registered actor factory.
    pub factory: String,
    /// Constructor parameters passed to the factory.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ActorSpec {
    /// Creates a new spec for the given factory alias.
    pub fn new(factory: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            params: serde_json::Value::Null,
        }
    }

    /// Sets the constructor parameters.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Actor for Echo {
        fn apply(&mut self, inputs: Vec<Value>) -> Result<Value> {
            Ok(inputs.into_iter().next().unwrap_or_default())
        }
    }

    #[test]
    fn test_stateless_defaults() {
        let mut actor = Echo;
        assert!(actor.train(vec![]).is_err());
        assert!(actor.get_state().unwrap().is_empty());
        assert!(actor.set_state(Bytes::from_static(b"ignored")).is_ok());
    }

    #[test]
    fn test_spec_display() {
        let spec = ActorSpec::new("mean").with_params(serde_json::json!({"axis": 0}));
        assert_eq!(spec.to_string(), r#"mean({"axis":0})"#);
    }

    #[test]
    fn test_spec_round_trip() {
        let spec = ActorSpec::new("scaler").with_params(serde_json::json!({"factor": 2.5}));
        let encoded = serde_json::to_string(&spec).unwrap();
        let decoded: ActorSpec = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, spec);
    }
}
