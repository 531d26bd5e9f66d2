//! Recursive branch search.

use dialogue_state::VariableStore;

use super::{Branch, PauseMask};
use crate::graph::{DialogueGraph, NodeId, NodeKind};
use crate::script::{evaluate_or_false, execute_or_skip, ScriptEngine};

/// Discovers the branches reachable from a node.
///
/// The explorer runs guards and instructions directly against the store it
/// is given; callers that must not keep those writes wrap the call in a
/// shadow scope.
pub struct BranchExplorer<'a, G: ?Sized, S: ?Sized> {
    graph: &'a G,
    script: &'a S,
    pause_on: PauseMask,
    explore_limit: usize,
    start_executed: bool,
}

impl<'a, G, S> BranchExplorer<'a, G, S>
where
    G: DialogueGraph + ?Sized,
    S: ScriptEngine + ?Sized,
{
    /// Create an explorer. An `explore_limit` of zero is raised to one.
    pub fn new(graph: &'a G, script: &'a S, pause_on: PauseMask, explore_limit: usize) -> Self {
        Self {
            graph,
            script,
            pause_on,
            explore_limit: explore_limit.max(1),
            start_executed: false,
        }
    }

    /// Mark the start node's own instruction as already run, so exploration
    /// does not run it again.
    pub fn start_executed(mut self, executed: bool) -> Self {
        self.start_executed = executed;
        self
    }

    /// Explore every output pin of `start`.
    ///
    /// # Algorithm
    ///
    /// 1. Stop with an invalid branch once the path holds `explore_limit` nodes
    /// 2. Stop with a valid branch on a pause-worthy node (except `start`)
    /// 3. Jumps continue at their fixed target pin
    /// 4. Instruction nodes run their expression (skipped for `start` when
    ///    [`start_executed`](Self::start_executed) is set); condition nodes
    ///    pick output pin 0 or 1
    /// 5. A node without edges ends a valid branch
    /// 6. Otherwise every edge is explored in its own shadow scope: the pin
    ///    instruction runs, then the target guard is checked; a failed guard
    ///    ends an invalid branch at the target
    ///
    /// Branches come back in pin order, then edge order, indexed from 0.
    pub fn explore(&self, start: NodeId, variables: &mut VariableStore) -> Vec<Branch> {
        self.run(start, None, variables)
    }

    /// Explore from `start` through a single output pin only.
    pub fn explore_through_pin(
        &self,
        start: NodeId,
        pin: usize,
        variables: &mut VariableStore,
    ) -> Vec<Branch> {
        self.run(start, Some(pin), variables)
    }

    fn run(&self, start: NodeId, only_pin: Option<usize>, variables: &mut VariableStore) -> Vec<Branch> {
        let mut branches = Vec::new();
        self.visit(start, 0, Vec::new(), only_pin, variables, &mut branches);

        for (index, branch) in branches.iter_mut().enumerate() {
            branch.set_index(index);
        }
        tracing::debug!(start = %start, count = branches.len(), "explored branches");
        branches
    }

    fn visit(
        &self,
        id: NodeId,
        depth: usize,
        mut path: Vec<NodeId>,
        only_pin: Option<usize>,
        variables: &mut VariableStore,
        out: &mut Vec<Branch>,
    ) {
        path.push(id);

        let Some(node) = self.graph.node(id) else {
            tracing::warn!(node = %id, "exploration reached a missing node");
            out.push(Branch::new(path, false));
            return;
        };
        tracing::trace!(node = %node.technical_name, depth, "visiting");

        if depth > 0 && !node.is_jump() && self.pause_on.matches(node) {
            out.push(Branch::new(path, true));
            return;
        }

        let mut chosen_pin = only_pin;
        match &node.kind {
            NodeKind::Jump { target, pin_index } => {
                self.follow(*target, *pin_index, depth, path, variables, out);
                return;
            }
            NodeKind::Instruction { expression } if !expression.trim().is_empty() => {
                if depth > 0 || !self.start_executed {
                    execute_or_skip(self.script, expression, variables);
                }
            }
            NodeKind::Condition { expression } if only_pin.is_none() => {
                let holds = expression.trim().is_empty()
                    || evaluate_or_false(self.script, expression, variables);
                chosen_pin = Some(if holds { 0 } else { 1 });
            }
            _ => {}
        }

        let pins: Vec<_> = self
            .graph
            .output_pins(id)
            .iter()
            .filter(|pin| chosen_pin.map_or(true, |only| pin.index == only))
            .collect();

        if pins.iter().all(|pin| pin.edges.is_empty()) {
            out.push(Branch::new(path, true));
            return;
        }

        // Each edge sees only its own pin's writes.
        for pin in pins {
            for (target, target_pin) in self.graph.edge_targets(pin) {
                let mut scope = variables.shadow();
                if let Some(instruction) = pin.instruction() {
                    execute_or_skip(self.script, instruction, &mut *scope);
                }
                self.follow(target, target_pin, depth, path.clone(), &mut *scope, out);
            }
        }
    }

    /// Enter `target` through input pin `target_pin`, checking its guard.
    fn follow(
        &self,
        target: NodeId,
        target_pin: usize,
        depth: usize,
        path: Vec<NodeId>,
        variables: &mut VariableStore,
        out: &mut Vec<Branch>,
    ) {
        if depth + 1 >= self.explore_limit {
            tracing::warn!(node = %target, limit = self.explore_limit, "explore limit reached");
            out.push(Branch::new(path, false));
            return;
        }

        let Some(input) = self.graph.input_pin(target, target_pin) else {
            tracing::warn!(node = %target, pin = target_pin, "edge points at a missing node or pin");
            out.push(Branch::new(with_node(path, target), false));
            return;
        };

        if let Some(guard) = input.guard() {
            if !evaluate_or_false(self.script, guard, variables) {
                tracing::trace!(node = %target, guard, "guard closed");
                out.push(Branch::new(with_node(path, target), false));
                return;
            }
        }

        self.visit(target, depth + 1, path, None, variables, out);
    }
}

fn with_node(mut path: Vec<NodeId>, node: NodeId) -> Vec<NodeId> {
    path.push(node);
    path
}
