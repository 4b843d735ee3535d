//! Actor-wrapping functor instructions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Instruction;
use crate::error::{FlowError, FlowResult};
use sluice_core::{Actor, ActorRegistry, ActorSpec, Value};

/// Primary objective of a functor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Objective {
    /// Invoke the actor's apply path, producing its output value.
    Apply,
    /// Invoke the actor's train path, producing its new serialized state.
    Train,
}

/// An instruction wrapping one actor invocation.
///
/// A *mapper* runs the apply objective, a *consumer* runs the train
/// objective and returns the actor's refreshed state. A *shifted* functor
/// first consumes a leading state argument via `set_state` before invoking
/// the objective on the remaining arguments.
///
/// The actor is instantiated from its spec on first invocation and cached
/// for the lifetime of the functor; one live actor per functor, not per
/// invocation.
pub struct Functor {
    spec: ActorSpec,
    objective: Objective,
    shifted: bool,
    registry: Arc<ActorRegistry>,
    actor: Mutex<Option<Box<dyn Actor>>>,
}

impl Functor {
    /// Creates a mapper functor wrapping the actor's apply path.
    pub fn mapper(registry: Arc<ActorRegistry>, spec: ActorSpec) -> Self {
        Self {
            spec,
            objective: Objective::Apply,
            shifted: false,
            registry,
            actor: Mutex::new(None),
        }
    }

    /// Creates a consumer functor wrapping the actor's train path.
    pub fn consumer(registry: Arc<ActorRegistry>, spec: ActorSpec) -> Self {
        Self {
            spec,
            objective: Objective::Train,
            shifted: false,
            registry,
            actor: Mutex::new(None),
        }
    }

    /// Shifts a leading state-consuming step ahead of the objective.
    pub fn shifted(mut self) -> Self {
        self.shifted = true;
        self
    }

    /// Returns the functor's objective.
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Returns whether a leading state argument is consumed.
    pub const fn is_shifted(&self) -> bool {
        self.shifted
    }

    /// Returns the wrapped actor spec.
    pub fn spec(&self) -> &ActorSpec {
        &self.spec
    }
}

#[async_trait]
impl Instruction for Functor {
    fn mnemonic(&self) -> &'static str {
        match self.objective {
            Objective::Apply => "mapper",
            Objective::Train => "consumer",
        }
    }

    async fn invoke(&self, mut args: Vec<Value>) -> FlowResult<Value> {
        let mut guard = self.actor.lock().await;
        let actor = match guard.as_mut() {
            Some(actor) => actor,
            None => guard.insert(self.registry.instantiate(&self.spec)?),
        };

        if self.shifted {
            if args.is_empty() {
                return Err(FlowError::Internal(
                    "shifted functor invoked without a state argument".into(),
                ));
            }
            match args.remove(0) {
                // Absent state on a first-ever generation is legitimate.
                Value::Null => {}
                Value::Bytes(state) if state.is_empty() => {}
                Value::Bytes(state) => actor.set_state(state).map_err(FlowError::Actor)?,
                other => return Err(FlowError::type_mismatch("bytes", &other)),
            }
        }

        match self.objective {
            Objective::Apply => Ok(actor.apply(args)?),
            Objective::Train => {
                actor.train(args)?;
                Ok(Value::Bytes(actor.get_state()?))
            }
        }
    }
}

impl std::fmt::Debug for Functor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Functor")
            .field("spec", &self.spec)
            .field("objective", &self.objective)
            .field("shifted", &self.shifted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    struct Counter {
        count: u64,
    }

    impl Actor for Counter {
        fn apply(&mut self, _inputs: Vec<Value>) -> sluice_core::Result<Value> {
            Ok(Value::Json(serde_json::json!(self.count)))
        }

        fn train(&mut self, inputs: Vec<Value>) -> sluice_core::Result<()> {
            self.count += inputs.len() as u64;
            Ok(())
        }

        fn get_state(&self) -> sluice_core::Result<Bytes> {
            Ok(Bytes::from(self.count.to_be_bytes().to_vec()))
        }

        fn set_state(&mut self, state: Bytes) -> sluice_core::Result<()> {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&state);
            self.count = u64::from_be_bytes(buf);
            Ok(())
        }
    }

    fn registry() -> Arc<ActorRegistry> {
        let mut registry = ActorRegistry::new();
        registry
            .register("counter", |_| Ok(Box::new(Counter { count: 0 }) as Box<dyn Actor>))
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_mapper_applies() {
        let mapper = Functor::mapper(registry(), ActorSpec::new("counter"));
        let result = mapper.invoke(vec![]).await.unwrap();
        assert_eq!(result, Value::Json(serde_json::json!(0)));
    }

    #[tokio::test]
    async fn test_consumer_returns_new_state() {
        let consumer = Functor::consumer(registry(), ActorSpec::new("counter"));
        let state = consumer
            .invoke(vec![Value::Json(serde_json::json!(1))])
            .await
            .unwrap();
        assert_eq!(
            state,
            Value::Bytes(Bytes::from(1u64.to_be_bytes().to_vec()))
        );
    }

    #[tokio::test]
    async fn test_shifted_consumes_leading_state() {
        let mapper = Functor::mapper(registry(), ActorSpec::new("counter")).shifted();
        let state = Value::Bytes(Bytes::from(41u64.to_be_bytes().to_vec()));
        let result = mapper.invoke(vec![state]).await.unwrap();
        assert_eq!(result, Value::Json(serde_json::json!(41)));
    }

    #[tokio::test]
    async fn test_shifted_tolerates_absent_state() {
        let mapper = Functor::mapper(registry(), ActorSpec::new("counter")).shifted();
        let result = mapper.invoke(vec![Value::Null]).await.unwrap();
        assert_eq!(result, Value::Json(serde_json::json!(0)));
    }

    #[tokio::test]
    async fn test_actor_is_cached_across_invocations() {
        let consumer = Functor::consumer(registry(), ActorSpec::new("counter"));
        consumer
            .invoke(vec![Value::Json(serde_json::json!(1))])
            .await
            .unwrap();
        let state = consumer
            .invoke(vec![Value::Json(serde_json::json!(1))])
            .await
            .unwrap();
        // Two trainings accumulated in the same live actor.
        assert_eq!(
            state,
            Value::Bytes(Bytes::from(2u64.to_be_bytes().to_vec()))
        );
    }
}
