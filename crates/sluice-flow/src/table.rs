//! Symbol table with a rebindable instruction index.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use derive_more::{Debug, Display, From, Into};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FlowError, FlowResult};
use crate::instruction::Instruction;
use crate::node::NodeId;
use crate::symbol::Symbol;
use sluice_assets::GroupId;

/// Unique handle of a registered instruction.
///
/// Keys are random and serve table bookkeeping only; they carry no runtime
/// meaning and are never reused, so rebinding an index slot leaves all
/// previously recorded argument links intact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct InstructionKey(Uuid);

impl InstructionKey {
    /// Creates a new random instruction key.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstructionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for InstructionKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Lookup slot of the rebindable instruction index.
///
/// Node slots address the functor compiled for one node identity; group
/// slots address the current state source of a node group, which starts as
/// the group's loader and is rebound to the training functor once one is
/// compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// Functor compiled for a node identity.
    Node(NodeId),
    /// Current state source of a node group.
    Group(GroupId),
}

/// Accumulates instructions and their argument links during compilation.
///
/// Arguments live in two spaces: an optional *shifted* leading slot (the
/// state consumed by a stateful functor) and the contiguous positional
/// *port* slots. Linearization validates completeness, acyclicity and the
/// single-terminal invariant before emitting the ordered symbol sequence.
#[derive(Default)]
pub struct SymbolTable {
    order: Vec<InstructionKey>,
    instructions: HashMap<InstructionKey, Arc<dyn Instruction>>,
    shifted: HashMap<InstructionKey, InstructionKey>,
    ports: HashMap<InstructionKey, BTreeMap<usize, InstructionKey>>,
    index: HashMap<SlotKey, InstructionKey>,
}

impl SymbolTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instruction, returning its fresh key.
    pub fn insert(&mut self, instruction: Arc<dyn Instruction>) -> InstructionKey {
        let key = InstructionKey::new();
        self.order.push(key);
        self.instructions.insert(key, instruction);
        key
    }

    /// Returns a registered instruction by key.
    pub fn get(&self, key: InstructionKey) -> Option<&Arc<dyn Instruction>> {
        self.instructions.get(&key)
    }

    /// Returns the number of registered instructions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the table has no instructions.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Binds an index slot to an instruction.
    ///
    /// Binding an occupied slot is a table-corruption bug, not a graph
    /// error, and is rejected.
    pub fn bind(&mut self, slot: SlotKey, key: InstructionKey) -> FlowResult<()> {
        if self.index.contains_key(&slot) {
            return Err(FlowError::Internal(format!(
                "index slot already bound: {slot:?}"
            )));
        }
        self.index.insert(slot, key);
        Ok(())
    }

    /// Rebinds an index slot, returning the previously bound key.
    pub fn rebind(&mut self, slot: SlotKey, key: InstructionKey) -> Option<InstructionKey> {
        self.index.insert(slot, key)
    }

    /// Looks up the instruction currently bound to an index slot.
    pub fn lookup(&self, slot: SlotKey) -> Option<InstructionKey> {
        self.index.get(&slot).copied()
    }

    /// Links an argument into a positional port slot of an instruction.
    pub fn link(
        &mut self,
        instruction: InstructionKey,
        port: usize,
        argument: InstructionKey,
    ) -> FlowResult<()> {
        let slots = self.ports.entry(instruction).or_default();
        if slots.contains_key(&port) {
            return Err(FlowError::Internal(format!(
                "argument slot {port} of {instruction} already linked"
            )));
        }
        slots.insert(port, argument);
        Ok(())
    }

    /// Sets the shifted leading state argument of an instruction.
    pub fn shift(&mut self, instruction: InstructionKey, argument: InstructionKey) -> FlowResult<()> {
        if self.shifted.contains_key(&instruction) {
            return Err(FlowError::Internal(format!(
                "state argument of {instruction} already shifted in"
            )));
        }
        self.shifted.insert(instruction, argument);
        Ok(())
    }

    /// Returns whether any instruction links the given key as an argument.
    pub fn is_referenced(&self, key: InstructionKey) -> bool {
        self.shifted.values().any(|argument| *argument == key)
            || self
                .ports
                .values()
                .any(|slots| slots.values().any(|argument| *argument == key))
    }

    /// Removes an instruction and its own argument links.
    pub fn remove(&mut self, key: InstructionKey) {
        self.order.retain(|candidate| *candidate != key);
        self.instructions.remove(&key);
        self.shifted.remove(&key);
        self.ports.remove(&key);
    }

    /// Prunes unwrapping getters left orphaned over zero-argument stubs.
    ///
    /// A getter whose sole argument takes no inputs of its own carries no
    /// data; if nothing consumes the getter either, it would linearize as a
    /// spurious terminal leaf.
    pub fn prune_stub_getters(&mut self, getters: &[InstructionKey]) {
        let stubs: Vec<InstructionKey> = getters
            .iter()
            .copied()
            .filter(|getter| !self.is_referenced(*getter))
            .filter(|getter| {
                self.ports
                    .get(getter)
                    .and_then(|slots| slots.get(&0))
                    .and_then(|argument| self.instructions.get(argument))
                    .is_some_and(|instruction| instruction.arity() == Some(0))
            })
            .collect();

        for stub in stubs {
            self.remove(stub);
        }
    }

    /// Assembles the complete argument list of an instruction.
    fn arguments(&self, key: InstructionKey) -> FlowResult<Vec<InstructionKey>> {
        let mut arguments = Vec::new();
        if let Some(shifted) = self.shifted.get(&key) {
            arguments.push(*shifted);
        }

        if let Some(slots) = self.ports.get(&key) {
            for (position, (port, argument)) in slots.iter().enumerate() {
                if *port != position {
                    return Err(FlowError::DanglingArgument {
                        key,
                        slot: position,
                    });
                }
                arguments.push(*argument);
            }
        }

        if let Some(expected) = self.instructions[&key].arity() {
            if arguments.len() != expected {
                return Err(FlowError::ArityMismatch {
                    key,
                    expected,
                    actual: arguments.len(),
                });
            }
        }

        Ok(arguments)
    }

    /// Validates the table and emits the dependency-ordered symbol sequence.
    ///
    /// Fails on dangling argument slots, arity mismatches, cycles, and
    /// anything but exactly one terminal instruction.
    pub fn linearize(self) -> FlowResult<Vec<Symbol>> {
        if self.order.is_empty() {
            return Ok(Vec::new());
        }

        let mut graph = DiGraph::<InstructionKey, ()>::new();
        let mut indices = HashMap::new();
        for key in &self.order {
            indices.insert(*key, graph.add_node(*key));
        }

        let mut arguments = HashMap::new();
        let mut referenced = HashSet::new();
        for key in &self.order {
            let args = self.arguments(*key)?;
            for argument in &args {
                let from = indices.get(argument).ok_or(FlowError::DanglingArgument {
                    key: *key,
                    slot: args.iter().position(|a| a == argument).unwrap_or(0),
                })?;
                graph.add_edge(*from, indices[key], ());
                referenced.insert(*argument);
            }
            arguments.insert(*key, args);
        }

        let terminals = self
            .order
            .iter()
            .filter(|key| !referenced.contains(key))
            .count();
        if terminals != 1 {
            return Err(FlowError::MultipleOutputs { count: terminals });
        }

        let sorted = toposort(&graph, None).map_err(|_| FlowError::CyclicFlow)?;

        let mut symbols = Vec::with_capacity(sorted.len());
        for index in sorted {
            let key = graph[index];
            symbols.push(Symbol {
                key,
                instruction: self.instructions[&key].clone(),
                arguments: arguments.remove(&key).unwrap_or_default(),
            });
        }

        Ok(symbols)
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("instructions", &self.order.len())
            .field("index", &self.index.len())
            .finish()
    }
}
