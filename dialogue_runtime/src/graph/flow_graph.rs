//! In-memory dialogue graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{DialogueGraph, Edge, InputPin, Node, NodeId, NodeKind, OutputPin};
use crate::error::FlowError;

/// A dialogue graph held in memory.
///
/// Nodes are kept by ID with their insertion order remembered, so iteration
/// and validation output are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl FlowGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the default pin layout for its kind.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.insert_node(Node::new(kind))
    }

    /// Insert a fully built node, replacing any node with the same ID.
    pub fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
        id
    }

    /// Remove a node together with every edge pointing at it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);

        for other in self.nodes.values_mut() {
            for pin in &mut other.output_pins {
                pin.edges.retain(|edge| edge.target_node != id);
            }
        }
        Some(node)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, FlowError> {
        self.nodes.get_mut(&id).ok_or(FlowError::NodeNotFound(id))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Append an input pin, returning its index.
    pub fn add_input_pin(&mut self, node: NodeId) -> Result<usize, FlowError> {
        let target = self.node_mut(node)?;
        let index = target.input_pins.len();
        target.input_pins.push(InputPin::new(node, index));
        Ok(index)
    }

    /// Append an output pin, returning its index.
    pub fn add_output_pin(&mut self, node: NodeId, label: Option<String>) -> Result<usize, FlowError> {
        let target = self.node_mut(node)?;
        let index = target.output_pins.len();
        let mut pin = OutputPin::new(node, index);
        pin.label = label;
        target.output_pins.push(pin);
        Ok(index)
    }

    /// Attach a guard to an input pin, replacing any previous one.
    pub fn set_guard(
        &mut self,
        node: NodeId,
        pin: usize,
        expression: impl Into<String>,
    ) -> Result<(), FlowError> {
        let target = self.node_mut(node)?;
        let input = target
            .input_pins
            .get_mut(pin)
            .ok_or(FlowError::PinNotFound { node, index: pin })?;
        input.guard = Some(expression.into());
        Ok(())
    }

    /// Attach an instruction to an output pin, replacing any previous one.
    pub fn set_instruction(
        &mut self,
        node: NodeId,
        pin: usize,
        expression: impl Into<String>,
    ) -> Result<(), FlowError> {
        let target = self.node_mut(node)?;
        let output = target
            .output_pins
            .get_mut(pin)
            .ok_or(FlowError::PinNotFound { node, index: pin })?;
        output.instruction = Some(expression.into());
        Ok(())
    }

    /// Connect output pin `from_pin` of `from` to input pin `to_pin` of `to`.
    ///
    /// Both pins must exist. Self-loops and several edges into one input
    /// pin are allowed; an identical edge twice is not.
    pub fn connect(
        &mut self,
        from: NodeId,
        from_pin: usize,
        to: NodeId,
        to_pin: usize,
    ) -> Result<(), FlowError> {
        let target = self.nodes.get(&to).ok_or(FlowError::NodeNotFound(to))?;
        if to_pin >= target.input_pins.len() {
            return Err(FlowError::PinNotFound {
                node: to,
                index: to_pin,
            });
        }

        let source = self.node_mut(from)?;
        let pin = source
            .output_pins
            .get_mut(from_pin)
            .ok_or(FlowError::PinNotFound {
                node: from,
                index: from_pin,
            })?;

        let edge = Edge {
            target_node: to,
            target_pin: to_pin,
        };
        if pin.edges.contains(&edge) {
            return Err(FlowError::DuplicateEdge {
                from,
                pin: from_pin,
                to,
                target_pin: to_pin,
            });
        }
        pin.edges.push(edge);
        Ok(())
    }

    /// Connect output pin 0 of `from` to input pin 0 of `to`.
    pub fn link(&mut self, from: NodeId, to: NodeId) -> Result<(), FlowError> {
        self.connect(from, 0, to, 0)
    }

    /// Remove an edge. Returns whether it existed.
    pub fn disconnect(&mut self, from: NodeId, from_pin: usize, to: NodeId, to_pin: usize) -> bool {
        let Some(pin) = self
            .nodes
            .get_mut(&from)
            .and_then(|node| node.output_pins.get_mut(from_pin))
        else {
            return false;
        };

        let before = pin.edges.len();
        pin.edges
            .retain(|edge| !(edge.target_node == to && edge.target_pin == to_pin));
        pin.edges.len() != before
    }
}

impl DialogueGraph for FlowGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }
}
