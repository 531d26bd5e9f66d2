//! Dialogue graph model.
//!
//! The graph consists of:
//! - **Nodes**: lines, hubs, conditions, instructions, jumps and containers
//! - **Pins**: ordered inputs (optionally guarded) and outputs (optionally
//!   carrying an instruction)
//! - **Edges**: links from an output pin to an input pin of another node
//!
//! The flow player only reads graphs, through the [`DialogueGraph`] trait.

mod flow_graph;
mod node;
mod validation;

pub use flow_graph::*;
pub use node::*;
pub use validation::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub Uuid);

impl PinId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only access to a dialogue graph during traversal.
///
/// Only [`node`](DialogueGraph::node) is required; the pin and edge queries
/// default to reading the node's own pin lists.
pub trait DialogueGraph {
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Output pins of a node in declaration order; empty for unknown nodes.
    fn output_pins(&self, id: NodeId) -> &[OutputPin] {
        self.node(id).map(|n| n.output_pins.as_slice()).unwrap_or(&[])
    }

    fn input_pin(&self, id: NodeId, index: usize) -> Option<&InputPin> {
        self.node(id)?.input_pins.get(index)
    }

    /// `(node, input pin index)` targets of an output pin, in edge order.
    fn edge_targets(&self, pin: &OutputPin) -> Vec<(NodeId, usize)> {
        pin.edges
            .iter()
            .map(|edge| (edge.target_node, edge.target_pin))
            .collect()
    }
}

impl<G: DialogueGraph + ?Sized> DialogueGraph for &G {
    fn node(&self, id: NodeId) -> Option<&Node> {
        (**self).node(id)
    }

    fn output_pins(&self, id: NodeId) -> &[OutputPin] {
        (**self).output_pins(id)
    }

    fn input_pin(&self, id: NodeId, index: usize) -> Option<&InputPin> {
        (**self).input_pin(id, index)
    }

    fn edge_targets(&self, pin: &OutputPin) -> Vec<(NodeId, usize)> {
        (**self).edge_targets(pin)
    }
}
