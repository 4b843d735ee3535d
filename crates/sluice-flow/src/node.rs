//! Flow node description, the compiler's input interface.
//!
//! Nodes are produced by an external graph/DSL layer; the compiler only
//! requires that every reachable worker node is visited exactly once, in any
//! order.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sluice_assets::GroupId;
use sluice_core::ActorSpec;

/// Unique identifier for a node in a flow graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Creates a new random node ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a node ID from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// One downstream consumer of a node output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Identity of the consuming node.
    pub node: NodeId,
    /// Input port index on the consuming node.
    pub port: usize,
}

impl Subscription {
    /// Creates a new subscription.
    pub const fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

/// A worker node of a flow graph.
///
/// All physical replicas of one logical stateful unit share a group
/// identity; at most one replica per group carries the `trained` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identity of this node.
    pub uid: NodeId,
    /// Group identity shared by replicas of one logical unit.
    pub gid: GroupId,
    /// Whether the underlying actor carries internal state.
    pub stateful: bool,
    /// Whether this particular replica performs training.
    pub trained: bool,
    /// Declarative spec instantiating the underlying actor.
    pub spec: ActorSpec,
    /// Output ports, each fanning out to zero or more subscribers.
    pub outputs: Vec<Vec<Subscription>>,
}

impl Node {
    /// Creates a stateless worker node with a single output port.
    pub fn stateless(spec: ActorSpec) -> Self {
        Self {
            uid: NodeId::new(),
            gid: GroupId::new(),
            stateful: false,
            trained: false,
            spec,
            outputs: vec![Vec::new()],
        }
    }

    /// Creates a stateful worker node with a single output port.
    pub fn stateful(spec: ActorSpec, gid: GroupId) -> Self {
        Self {
            uid: NodeId::new(),
            gid,
            stateful: true,
            trained: false,
            spec,
            outputs: vec![Vec::new()],
        }
    }

    /// Marks this replica as the training one of its group.
    pub fn trained(mut self) -> Self {
        self.trained = true;
        self
    }

    /// Resizes the node to the given number of output ports.
    pub fn with_ports(mut self, ports: usize) -> Self {
        self.outputs.resize_with(ports, Vec::new);
        self
    }

    /// Subscribes a consumer to one of this node's output ports.
    ///
    /// # Panics
    ///
    /// Panics if the output port does not exist; ports are declared up
    /// front with [`Node::with_ports`].
    pub fn subscribe(&mut self, output: usize, subscription: Subscription) {
        self.outputs[output].push(subscription);
    }

    /// Returns whether this node has more than one output port.
    pub fn is_multi_output(&self) -> bool {
        self.outputs.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_output_by_default() {
        let node = Node::stateless(ActorSpec::new("echo"));
        assert_eq!(node.outputs.len(), 1);
        assert!(!node.is_multi_output());
        assert!(!node.stateful);
    }

    #[test]
    fn test_subscribe_ports() {
        let mut node = Node::stateless(ActorSpec::new("split")).with_ports(2);
        let consumer = NodeId::new();
        node.subscribe(0, Subscription::new(consumer, 0));
        node.subscribe(1, Subscription::new(consumer, 1));
        assert!(node.is_multi_output());
        assert_eq!(node.outputs[0].len(), 1);
        assert_eq!(node.outputs[1].len(), 1);
    }
}
