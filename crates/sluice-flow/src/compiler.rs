//! Flow graph compiler.
//!
//! The compiler visits every worker node of a flow path exactly once, in
//! any order, and accumulates a [`SymbolTable`]: deduplicated instructions
//! plus the ordered upstream arguments of each. Stateful nodes get their
//! persisted state shifted in through a per-group loader; training replicas
//! additionally dump their refreshed state and feed the single shared
//! committer. Linearization then emits the dependency-ordered symbol
//! sequence.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::TRACING_TARGET;
use crate::error::{FlowError, FlowResult};
use crate::instruction::{Committer, Dumper, Functor, Getter, Loader};
use crate::node::{Node, NodeId};
use crate::symbol::Symbol;
use crate::table::{InstructionKey, SlotKey, SymbolTable};
use sluice_assets::{GroupId, StateAccessor};
use sluice_core::ActorRegistry;

/// Compiles a flow path into an executable symbol sequence.
///
/// The compiler is single-use: construct, feed the path, take the symbols.
/// Construction of loader/dumper/committer instructions is its only side
/// effect; nothing blocks or suspends during compilation.
pub struct Compiler {
    registry: Arc<ActorRegistry>,
    accessor: Option<Arc<StateAccessor>>,
    table: SymbolTable,
    visited: HashSet<NodeId>,
    loaders: HashMap<GroupId, InstructionKey>,
    getters: Vec<InstructionKey>,
    committer: Option<InstructionKey>,
    pending: HashMap<NodeId, Vec<(usize, InstructionKey)>>,
}

impl Compiler {
    /// Creates a compiler over an actor registry and an optional accessor.
    ///
    /// Without an accessor only fully stateless paths compile; any stateful
    /// node requires its group to be tracked by the accessor.
    pub fn new(registry: Arc<ActorRegistry>, accessor: Option<Arc<StateAccessor>>) -> Self {
        Self {
            registry,
            accessor,
            table: SymbolTable::new(),
            visited: HashSet::new(),
            loaders: HashMap::new(),
            getters: Vec::new(),
            committer: None,
            pending: HashMap::new(),
        }
    }

    /// Compiles the given path into its symbol sequence.
    pub fn compile(mut self, path: &[Node]) -> FlowResult<Vec<Symbol>> {
        for node in path {
            self.visit(node)?;
        }
        self.finalize()
    }

    /// Visits one worker node, registering its instructions and links.
    fn visit(&mut self, node: &Node) -> FlowResult<()> {
        if !self.visited.insert(node.uid) {
            return Err(FlowError::NodeCollision { uid: node.uid });
        }

        tracing::trace!(
            target: TRACING_TARGET,
            uid = %node.uid,
            stateful = node.stateful,
            trained = node.trained,
            "Visiting node"
        );

        let functor = self.register_functor(node)?;

        if node.stateful {
            self.wire_state(node, functor)?;
        }

        self.wire_subscriptions(node, functor)?;

        // Argument links recorded before this node was visited.
        if let Some(links) = self.pending.remove(&node.uid) {
            for (port, source) in links {
                self.table.link(functor, port, source)?;
            }
        }

        Ok(())
    }

    /// Builds and registers the functor wrapping the node's actor.
    fn register_functor(&mut self, node: &Node) -> FlowResult<InstructionKey> {
        let mut functor = if node.trained {
            Functor::consumer(self.registry.clone(), node.spec.clone())
        } else {
            Functor::mapper(self.registry.clone(), node.spec.clone())
        };
        if node.stateful {
            // Sanity-checked here so the failure names the node, not the
            // instruction that would later miss its state.
            self.group_accessor(node)?;
            functor = functor.shifted();
        }

        let key = self.table.insert(Arc::new(functor));
        self.table.bind(SlotKey::Node(node.uid), key)?;
        Ok(key)
    }

    /// Resolves the accessor tracking the node's group.
    ///
    /// A stateful node with no persisted group and no training replica is a
    /// registry/graph mismatch and aborts compilation.
    fn group_accessor(&self, node: &Node) -> FlowResult<&Arc<StateAccessor>> {
        let tracked = self
            .accessor
            .as_ref()
            .filter(|accessor| accessor.offset(node.gid).is_ok());

        match tracked {
            Some(accessor) => Ok(accessor),
            None if node.trained => Err(FlowError::UntrackedGroup { group: node.gid }),
            None => Err(FlowError::NonPersistentStateful { uid: node.uid }),
        }
    }

    /// Wires the state loading and, for training replicas, the dump/commit
    /// chain of a stateful node.
    fn wire_state(&mut self, node: &Node, functor: InstructionKey) -> FlowResult<()> {
        let accessor = self.group_accessor(node)?.clone();

        // One state source per group, shared by all replicas. The slot
        // starts at the group's loader and may later be rebound.
        let source = match self.table.lookup(SlotKey::Group(node.gid)) {
            Some(source) => source,
            None => {
                let loader = self
                    .table
                    .insert(Arc::new(Loader::new(accessor.clone(), node.gid)));
                self.table.bind(SlotKey::Group(node.gid), loader)?;
                self.loaders.insert(node.gid, loader);
                loader
            }
        };
        self.table.shift(functor, source)?;

        if node.trained {
            let dumper = self.table.insert(Arc::new(Dumper::new(accessor.clone())));
            self.table.link(dumper, 0, functor)?;

            let committer = match self.committer {
                Some(committer) => committer,
                None => {
                    let committer = self.table.insert(Arc::new(Committer::new(accessor.clone())));
                    self.committer = Some(committer);
                    committer
                }
            };
            let offset = accessor.offset(node.gid)?;
            self.table.link(committer, offset, dumper)?;

            // The training functor takes over as the group's state source;
            // replicas compiled after this one consume the fresh state.
            self.table.rebind(SlotKey::Group(node.gid), functor);
        }

        Ok(())
    }

    /// Binds the node's output fan-out into its subscribers' argument slots.
    ///
    /// Single-output nodes bind their functor directly; multi-output nodes
    /// go through one getter per used output slot.
    fn wire_subscriptions(&mut self, node: &Node, functor: InstructionKey) -> FlowResult<()> {
        for (port, subscriptions) in node.outputs.iter().enumerate() {
            if subscriptions.is_empty() {
                continue;
            }

            let source = if node.is_multi_output() {
                let getter = self.table.insert(Arc::new(Getter::new(port)));
                self.table.link(getter, 0, functor)?;
                self.getters.push(getter);
                getter
            } else {
                functor
            };

            for subscription in subscriptions {
                match self.table.lookup(SlotKey::Node(subscription.node)) {
                    Some(subscriber) => {
                        self.table.link(subscriber, subscription.port, source)?;
                    }
                    None => {
                        self.pending
                            .entry(subscription.node)
                            .or_default()
                            .push((subscription.port, source));
                    }
                }
            }
        }

        Ok(())
    }

    /// Validates leftovers and linearizes the table.
    fn finalize(mut self) -> FlowResult<Vec<Symbol>> {
        if let Some(uid) = self.pending.keys().next() {
            return Err(FlowError::UnknownSubscriber { uid: *uid });
        }

        self.table.prune_stub_getters(&self.getters);

        let symbols = self.table.linearize()?;

        tracing::debug!(
            target: TRACING_TARGET,
            symbols = symbols.len(),
            "Flow path compiled"
        );

        Ok(symbols)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("visited", &self.visited.len())
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::node::Subscription;
    use sluice_assets::{Directory, StorageRegistry};
    use sluice_core::{Actor, ActorSpec, Value};

    struct Noop;

    impl Actor for Noop {
        fn apply(&mut self, _inputs: Vec<Value>) -> sluice_core::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn actors() -> Arc<ActorRegistry> {
        let mut registry = ActorRegistry::new();
        registry
            .register("noop", |_| Ok(Box::new(Noop) as Box<dyn Actor>))
            .unwrap();
        Arc::new(registry)
    }

    /// A linear stateless chain: source -> middle -> sink.
    fn chain() -> Vec<Node> {
        let mut source = Node::stateless(ActorSpec::new("noop"));
        let mut middle = Node::stateless(ActorSpec::new("noop"));
        let sink = Node::stateless(ActorSpec::new("noop"));
        source.subscribe(0, Subscription::new(middle.uid, 0));
        middle.subscribe(0, Subscription::new(sink.uid, 0));
        vec![source, middle, sink]
    }

    async fn accessor(groups: Vec<GroupId>) -> Arc<StateAccessor> {
        let registry = Arc::new(StorageRegistry::memory().unwrap());
        let directory = Directory::new(registry);
        let release = directory
            .project("census".parse().unwrap())
            .publish("1.0.0".parse().unwrap(), Bytes::from_static(b"pkg"))
            .await
            .unwrap();
        Arc::new(StateAccessor::new(&release, None, groups, None).await.unwrap())
    }

    #[test]
    fn test_stateless_chain_compiles_to_mappers() {
        let symbols = Compiler::new(actors(), None).compile(&chain()).unwrap();
        assert_eq!(symbols.len(), 3);
        assert!(symbols.iter().all(|s| s.instruction.mnemonic() == "mapper"));
        // Dependency order: each symbol's arguments precede it.
        assert!(symbols[0].arguments.is_empty());
        assert_eq!(symbols[1].arguments, vec![symbols[0].key]);
        assert_eq!(symbols[2].arguments, vec![symbols[1].key]);
    }

    #[test]
    fn test_visit_order_is_irrelevant() {
        let mut path = chain();
        path.reverse();
        let symbols = Compiler::new(actors(), None).compile(&path).unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[2].arguments, vec![symbols[1].key]);
    }

    #[test]
    fn test_compilation_shape_is_deterministic() {
        let path = chain();
        let first = Compiler::new(actors(), None).compile(&path).unwrap();
        let second = Compiler::new(actors(), None).compile(&path).unwrap();

        let shape = |symbols: &[Symbol]| -> Vec<(&'static str, usize)> {
            symbols
                .iter()
                .map(|s| (s.instruction.mnemonic(), s.arguments.len()))
                .collect()
        };
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn test_node_collision() {
        let node = Node::stateless(ActorSpec::new("noop"));
        let path = vec![node.clone(), node];
        let result = Compiler::new(actors(), None).compile(&path);
        assert!(matches!(result, Err(FlowError::NodeCollision { .. })));
    }

    #[test]
    fn test_unknown_subscriber() {
        let mut source = Node::stateless(ActorSpec::new("noop"));
        source.subscribe(0, Subscription::new(NodeId::new(), 0));
        let result = Compiler::new(actors(), None).compile(&[source]);
        assert!(matches!(result, Err(FlowError::UnknownSubscriber { .. })));
    }

    #[test]
    fn test_dangling_argument_slot() {
        let mut source = Node::stateless(ActorSpec::new("noop"));
        let sink = Node::stateless(ActorSpec::new("noop"));
        // Port 1 is linked but port 0 never is.
        source.subscribe(0, Subscription::new(sink.uid, 1));
        let result = Compiler::new(actors(), None).compile(&[source, sink]);
        assert!(matches!(
            result,
            Err(FlowError::DanglingArgument { slot: 0, .. })
        ));
    }

    #[test]
    fn test_stateful_node_requires_persistence() {
        let node = Node::stateful(ActorSpec::new("noop"), GroupId::new());
        let result = Compiler::new(actors(), None).compile(&[node]);
        assert!(matches!(
            result,
            Err(FlowError::NonPersistentStateful { .. })
        ));
    }

    #[tokio::test]
    async fn test_trained_node_requires_tracked_group() {
        let accessor = accessor(vec![GroupId::new()]).await;
        let node = Node::stateful(ActorSpec::new("noop"), GroupId::new()).trained();
        let result = Compiler::new(actors(), Some(accessor)).compile(&[node]);
        assert!(matches!(result, Err(FlowError::UntrackedGroup { .. })));
    }

    #[test]
    fn test_multi_output_synthesizes_getters() {
        let mut splitter = Node::stateless(ActorSpec::new("noop")).with_ports(2);
        let sink = Node::stateless(ActorSpec::new("noop"));
        splitter.subscribe(0, Subscription::new(sink.uid, 0));
        splitter.subscribe(1, Subscription::new(sink.uid, 1));

        let symbols = Compiler::new(actors(), None)
            .compile(&[splitter, sink])
            .unwrap();

        let getters: Vec<&Symbol> = symbols
            .iter()
            .filter(|s| s.instruction.mnemonic() == "getter")
            .collect();
        assert_eq!(getters.len(), 2);

        // Subscribers depend on the getters, never directly on the
        // multi-output functor.
        let splitter_key = symbols
            .iter()
            .find(|s| s.arguments.is_empty())
            .map(|s| s.key)
            .unwrap();
        let sink_symbol = symbols
            .iter()
            .find(|s| s.arguments.len() == 2)
            .unwrap();
        assert!(!sink_symbol.arguments.contains(&splitter_key));
        assert!(getters.iter().all(|g| g.arguments == vec![splitter_key]));
    }

    #[tokio::test]
    async fn test_shared_loader_across_replicas() {
        let gid = GroupId::new();
        let accessor = accessor(vec![gid]).await;

        let mut source = Node::stateless(ActorSpec::new("noop"));
        let mut first = Node::stateful(ActorSpec::new("noop"), gid);
        let mut second = Node::stateful(ActorSpec::new("noop"), gid);
        let sink = Node::stateless(ActorSpec::new("noop"));
        source.subscribe(0, Subscription::new(first.uid, 0));
        first.subscribe(0, Subscription::new(second.uid, 0));
        second.subscribe(0, Subscription::new(sink.uid, 0));

        let symbols = Compiler::new(actors(), Some(accessor))
            .compile(&[source, first, second, sink])
            .unwrap();

        let loaders: Vec<&Symbol> = symbols
            .iter()
            .filter(|s| s.instruction.mnemonic() == "loader")
            .collect();
        assert_eq!(loaders.len(), 1);

        // Both replicas shift in the same loader output.
        let loader_key = loaders[0].key;
        let shifted = symbols
            .iter()
            .filter(|s| s.arguments.first() == Some(&loader_key))
            .count();
        assert_eq!(shifted, 2);
    }

    #[tokio::test]
    async fn test_trained_replica_becomes_group_state_source() {
        let first_group = GroupId::new();
        let second_group = GroupId::new();
        let accessor = accessor(vec![first_group, second_group]).await;

        // A two-stage training chain: the apply replica of the first group
        // feeds the second trainer, so the whole DAG ends at the committer.
        let mut source = Node::stateless(ActorSpec::new("noop"));
        let mut trainer = Node::stateful(ActorSpec::new("noop"), first_group).trained();
        let mut applier = Node::stateful(ActorSpec::new("noop"), first_group);
        let downstream = Node::stateful(ActorSpec::new("noop"), second_group).trained();
        source.subscribe(0, Subscription::new(trainer.uid, 0));
        trainer.subscribe(0, Subscription::new(applier.uid, 0));
        applier.subscribe(0, Subscription::new(downstream.uid, 0));

        let symbols = Compiler::new(actors(), Some(accessor))
            .compile(&[source, trainer, applier, downstream])
            .unwrap();

        let source_key = symbols
            .iter()
            .find(|s| s.instruction.mnemonic() == "mapper" && s.arguments.is_empty())
            .map(|s| s.key)
            .unwrap();
        let trainer_symbol = symbols
            .iter()
            .find(|s| {
                s.instruction.mnemonic() == "consumer" && s.arguments.get(1) == Some(&source_key)
            })
            .unwrap();
        let applier_symbol = symbols
            .iter()
            .find(|s| s.instruction.mnemonic() == "mapper" && s.arguments.len() == 2)
            .unwrap();

        // The replica compiled after the trainer consumes the freshly
        // trained state rather than the stale loader output.
        assert_eq!(applier_symbol.arguments[0], trainer_symbol.key);

        // One shared committer receives both dumpers at their offsets.
        let committers: Vec<&Symbol> = symbols
            .iter()
            .filter(|s| s.instruction.mnemonic() == "committer")
            .collect();
        assert_eq!(committers.len(), 1);
        assert_eq!(committers[0].arguments.len(), 2);
    }
}
