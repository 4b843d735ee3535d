//! Actor factory registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::TRACING_TARGET;
use crate::actor::{Actor, ActorSpec};
use crate::error::{Error, Result};

/// Factory function constructing an actor from its declarative parameters.
pub type ActorFactory = Arc<dyn Fn(&serde_json::Value) -> Result<Box<dyn Actor>> + Send + Sync>;

/// In-memory actor factory registry.
///
/// Maps string aliases to actor factories. The table is populated by explicit
/// [`ActorRegistry::register`] calls during process startup; there is no
/// ambient discovery. Instructions resolve their [`ActorSpec`] against this
/// table on first invocation.
#[derive(Clone, Default)]
pub struct ActorRegistry {
    factories: HashMap<String, ActorFactory>,
}

impl ActorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under the given alias.
    ///
    /// Re-registering an alias is rejected so that two initialization paths
    /// cannot silently shadow each other.
    pub fn register<F>(&mut self, alias: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Actor>> + Send + Sync + 'static,
    {
        let alias = alias.into();
        if self.factories.contains_key(&alias) {
            return Err(Error::invalid_input()
                .with_message(format!("actor factory already registered: {alias}")));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            alias = %alias,
            "Actor factory registered"
        );

        self.factories.insert(alias, Arc::new(factory));
        Ok(())
    }

    /// Retrieves a factory by alias.
    pub fn get(&self, alias: &str) -> Result<&ActorFactory> {
        self.factories
            .get(alias)
            .ok_or_else(|| Error::not_found().with_message(format!("actor factory: {alias}")))
    }

    /// Instantiates an actor from its declarative spec.
    pub fn instantiate(&self, spec: &ActorSpec) -> Result<Box<dyn Actor>> {
        let factory = self.get(&spec.factory)?;
        factory(&spec.params)
    }

    /// Lists all registered aliases.
    pub fn list(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRegistry")
            .field("factories", &self.factories.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    struct Constant(serde_json::Value);

    impl Actor for Constant {
        fn apply(&mut self, _inputs: Vec<Value>) -> Result<Value> {
            Ok(Value::Json(self.0.clone()))
        }
    }

    fn registry() -> ActorRegistry {
        let mut registry = ActorRegistry::new();
        registry
            .register("constant", |params| {
                Ok(Box::new(Constant(params.clone())) as Box<dyn Actor>)
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_register_and_instantiate() {
        let registry = registry();
        let spec = ActorSpec::new("constant").with_params(serde_json::json!(42));
        let mut actor = registry.instantiate(&spec).unwrap();
        assert_eq!(
            actor.apply(vec![]).unwrap(),
            Value::Json(serde_json::json!(42))
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let result = registry.register("constant", |_| {
            Ok(Box::new(Constant(serde_json::Value::Null)) as Box<dyn Actor>)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_factory() {
        let registry = registry();
        let spec = ActorSpec::new("missing");
        assert!(registry.instantiate(&spec).is_err());
    }
}
