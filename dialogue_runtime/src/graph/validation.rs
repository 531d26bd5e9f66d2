//! Structural checks on a dialogue graph.
//!
//! The player copes with every problem reported here at runtime (broken
//! links become invalid branches), but finding them up front is cheaper.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{FlowGraph, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// Machine-readable category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    DanglingEdge,
    InvalidTargetPin,
    InvalidJumpTarget,
    EmptyCondition,
    EmptyInstruction,
    EmptyLine,
    OrphanedNode,
    CycleDetected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub node: NodeId,
    pub severity: ValidationSeverity,
    pub code: ValidationCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|issue| issue.code == code)
    }

    fn error(&mut self, node: NodeId, code: ValidationCode, message: String) {
        self.errors.push(ValidationIssue {
            node,
            severity: ValidationSeverity::Error,
            code,
            message,
        });
    }

    fn warning(&mut self, node: NodeId, code: ValidationCode, message: String) {
        self.warnings.push(ValidationIssue {
            node,
            severity: ValidationSeverity::Warning,
            code,
            message,
        });
    }
}

impl FlowGraph {
    /// Check the graph for broken links, empty content, orphans and cycles.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        let connected = self.connected_nodes();
        let check_orphans = self.node_count() > 1;

        for node in self.nodes() {
            for pin in &node.output_pins {
                for edge in &pin.edges {
                    match self.get_node(edge.target_node) {
                        None => report.error(
                            node.id,
                            ValidationCode::DanglingEdge,
                            format!(
                                "Output pin {} of '{}' points at missing node '{}'",
                                pin.index, node.technical_name, edge.target_node
                            ),
                        ),
                        Some(target) if edge.target_pin >= target.input_pins.len() => report.error(
                            node.id,
                            ValidationCode::InvalidTargetPin,
                            format!(
                                "Output pin {} of '{}' points at missing input pin {} of '{}'",
                                pin.index, node.technical_name, edge.target_pin, target.technical_name
                            ),
                        ),
                        Some(_) => {}
                    }
                }
            }

            if check_orphans && !connected.contains(&node.id) {
                report.warning(
                    node.id,
                    ValidationCode::OrphanedNode,
                    format!("Node '{}' is not connected to any other node", node.technical_name),
                );
            }

            match &node.kind {
                NodeKind::Line(line) if line.speaker.is_none() && line.text.is_empty() => {
                    report.warning(
                        node.id,
                        ValidationCode::EmptyLine,
                        format!("Line '{}' has no speaker or text", node.technical_name),
                    );
                }
                NodeKind::Jump { target, pin_index } => {
                    let reachable = self
                        .get_node(*target)
                        .is_some_and(|t| *pin_index < t.input_pins.len());
                    if !reachable {
                        report.error(
                            node.id,
                            ValidationCode::InvalidJumpTarget,
                            format!(
                                "Jump '{}' targets missing pin {} of '{}'",
                                node.technical_name, pin_index, target
                            ),
                        );
                    }
                }
                NodeKind::Condition { expression } if expression.trim().is_empty() => {
                    report.warning(
                        node.id,
                        ValidationCode::EmptyCondition,
                        format!("Condition '{}' has an empty expression", node.technical_name),
                    );
                }
                NodeKind::Instruction { expression } if expression.trim().is_empty() => {
                    report.warning(
                        node.id,
                        ValidationCode::EmptyInstruction,
                        format!("Instruction '{}' has an empty script", node.technical_name),
                    );
                }
                _ => {}
            }
        }

        for id in self.cycle_nodes() {
            if let Some(node) = self.get_node(id) {
                report.warning(
                    id,
                    ValidationCode::CycleDetected,
                    format!(
                        "Node '{}' is part of a cycle; exploration relies on the explore limit",
                        node.technical_name
                    ),
                );
            }
        }

        report
    }

    /// Nodes touching at least one edge or jump, at either end.
    fn connected_nodes(&self) -> HashSet<NodeId> {
        let mut connected = HashSet::new();
        for node in self.nodes() {
            let next = self.successors(node.id);
            if !next.is_empty() {
                connected.insert(node.id);
            }
            connected.extend(next);
        }
        connected
    }

    /// Successors of a node including jump redirects.
    fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get_node(id) else {
            return Vec::new();
        };
        let mut next: Vec<NodeId> = node
            .output_pins
            .iter()
            .flat_map(|pin| pin.edges.iter().map(|edge| edge.target_node))
            .collect();
        if let NodeKind::Jump { target, .. } = node.kind {
            next.push(target);
        }
        next
    }

    /// Nodes lying on at least one cycle, in graph order.
    ///
    /// A node is on a cycle when it can reach itself; computed with one
    /// reachability search per node, which is fine for authoring-sized graphs.
    fn cycle_nodes(&self) -> Vec<NodeId> {
        let adjacency: HashMap<NodeId, Vec<NodeId>> = self
            .nodes()
            .map(|node| (node.id, self.successors(node.id)))
            .collect();

        self.nodes()
            .map(|node| node.id)
            .filter(|&start| {
                let mut visited = HashSet::new();
                let mut stack = adjacency.get(&start).cloned().unwrap_or_default();
                while let Some(current) = stack.pop() {
                    if current == start {
                        return true;
                    }
                    if visited.insert(current) {
                        if let Some(next) = adjacency.get(&current) {
                            stack.extend(next.iter().copied());
                        }
                    }
                }
                false
            })
            .collect()
    }
}
