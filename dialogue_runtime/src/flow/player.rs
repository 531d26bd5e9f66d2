//! The flow player: a cursor over a dialogue graph.

use std::ops::{Deref, DerefMut};

use dialogue_state::VariableStore;
use serde::{Deserialize, Serialize};

use super::{Branch, BranchExplorer, FlowPlayerConfig, PauseMask};
use crate::error::FlowError;
use crate::events::FlowEvent;
use crate::graph::{DialogueGraph, Node, NodeId, NodeKind};
use crate::script::{execute_or_skip, ScriptEngine};

/// Coarse lifecycle state of a [`FlowPlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// No cursor.
    Idle,
    /// Cursor set, branches not explored yet.
    Positioned,
    /// Branches explored and available to play.
    BranchesReady,
    /// Cursor sits on a pause-worthy node reached by playing.
    Paused,
}

/// Walks a dialogue graph one pause point at a time.
///
/// The player owns the variable store. Exploration
/// ([`update_available_branches`](Self::update_available_branches)) runs in
/// a shadow scope and leaves the store untouched; playing a branch
/// ([`play`](Self::play)) re-runs its path and keeps every write.
pub struct FlowPlayer<G, S> {
    graph: G,
    script: S,
    variables: VariableStore,
    config: FlowPlayerConfig,
    cursor: Option<NodeId>,
    /// The cursor node's own instruction already ran when a play landed on it.
    cursor_executed: bool,
    branches: Vec<Branch>,
    branches_ready: bool,
    paused: bool,
    shadow_level: u32,
    events: Vec<FlowEvent>,
}

impl<G: DialogueGraph, S: ScriptEngine> FlowPlayer<G, S> {
    /// Create a player. Fails if the configuration is invalid or names a
    /// start node missing from the graph.
    pub fn new(
        graph: G,
        script: S,
        variables: VariableStore,
        config: FlowPlayerConfig,
    ) -> Result<Self, FlowError> {
        config.validate()?;
        if let Some(start) = config.start_on {
            if graph.node(start).is_none() {
                return Err(FlowError::NodeNotFound(start));
            }
        }

        Ok(Self {
            graph,
            script,
            variables,
            config,
            cursor: None,
            cursor_executed: false,
            branches: Vec::new(),
            branches_ready: false,
            paused: false,
            shadow_level: 0,
            events: Vec::new(),
        })
    }

    /// Create a player with the default configuration.
    pub fn with_defaults(graph: G, script: S, variables: VariableStore) -> Self {
        Self {
            graph,
            script,
            variables,
            config: FlowPlayerConfig::default(),
            cursor: None,
            cursor_executed: false,
            branches: Vec::new(),
            branches_ready: false,
            paused: false,
            shadow_level: 0,
            events: Vec::new(),
        }
    }

    // ==================== QUERIES ====================

    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    pub fn cursor_node(&self) -> Option<&Node> {
        self.cursor.and_then(|id| self.graph.node(id))
    }

    /// Branches from the last exploration; empty while stale.
    pub fn available_branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn state(&self) -> PlayerState {
        if self.cursor.is_none() {
            PlayerState::Idle
        } else if self.paused {
            PlayerState::Paused
        } else if self.branches_ready {
            PlayerState::BranchesReady
        } else {
            PlayerState::Positioned
        }
    }

    /// Whether traversal halts on this node.
    pub fn should_pause_on(&self, node: &Node) -> bool {
        self.config.pause_on.matches(node)
    }

    pub fn shadow_level(&self) -> u32 {
        self.shadow_level
    }

    pub fn is_shadowed(&self) -> bool {
        self.shadow_level > 0
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn script(&self) -> &S {
        &self.script
    }

    pub fn config(&self) -> &FlowPlayerConfig {
        &self.config
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn into_variables(self) -> VariableStore {
        self.variables
    }

    pub fn start_node(&self) -> Option<NodeId> {
        self.config.start_on
    }

    /// Events raised since the last drain, oldest first.
    pub fn events(&self) -> &[FlowEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.events)
    }

    // ==================== COMMANDS ====================

    /// Change which node kinds halt traversal. Explored branches become stale.
    pub fn set_pause_on(&mut self, pause_on: PauseMask) {
        self.config.pause_on = pause_on;
        self.invalidate_branches();
    }

    pub fn set_start_node(&mut self, id: NodeId) -> Result<(), FlowError> {
        self.require_node(id)?;
        self.config.start_on = Some(id);
        Ok(())
    }

    /// Move the cursor without exploring. Explored branches become stale.
    pub fn set_cursor(&mut self, id: NodeId) -> Result<(), FlowError> {
        self.require_node(id)?;
        self.move_cursor(Some(id));
        Ok(())
    }

    /// Return to idle: no cursor, no branches. Variables are kept.
    pub fn reset(&mut self) {
        self.move_cursor(None);
    }

    /// Position the cursor on the start node and advance to the first
    /// pause point.
    pub fn start(&mut self) -> Result<(), FlowError> {
        let start = self.config.start_on.ok_or(FlowError::NoStartNode)?;
        self.set_cursor(start)?;
        self.fast_forward_to_pause()
    }

    /// If the cursor is not on a pause-worthy node, play the first valid
    /// branch from it.
    pub fn fast_forward_to_pause(&mut self) -> Result<(), FlowError> {
        let cursor = self.cursor.ok_or(FlowError::NoCursor)?;
        let node = self.require_node(cursor)?;

        if self.config.pause_on.matches(node) {
            self.pause_at(cursor);
            return Ok(());
        }

        self.update_available_branches()?;
        if let Some(branch) = self.first_valid_branch() {
            self.play_branch(&branch)?;
        }
        Ok(())
    }

    /// Explore from the cursor inside a shadow scope and expose the result.
    pub fn update_available_branches(&mut self) -> Result<&[Branch], FlowError> {
        let cursor = self.cursor.ok_or(FlowError::NoCursor)?;
        let explored = self
            .shadowed_operation(|player| player.explore_from(cursor, None))
            .ok_or(FlowError::ShadowLimitReached {
                limit: self.config.shadow_level_limit,
            })?;

        self.expose(explored);
        Ok(self.branches.as_slice())
    }

    /// Play an exposed branch by index.
    pub fn play(&mut self, index: usize) -> Result<(), FlowError> {
        let branch = self
            .branches
            .get(index)
            .cloned()
            .ok_or(FlowError::BranchIndexOutOfRange {
                index,
                available: self.branches.len(),
            })?;
        self.play_branch(&branch)
    }

    /// Commit a branch: re-run its path for real and move the cursor to
    /// its last node.
    ///
    /// The branch must be valid and must start at the current cursor.
    pub fn play_branch(&mut self, branch: &Branch) -> Result<(), FlowError> {
        self.commit(branch, None)
    }

    /// Continue from the cursor through one output pin and play the first
    /// valid branch found. Returns whether the cursor moved.
    pub fn finish_current_paused_object(&mut self, pin: usize) -> Result<bool, FlowError> {
        let cursor = self.cursor.ok_or(FlowError::NoCursor)?;
        let node = self.require_node(cursor)?;
        if pin >= node.output_pins.len() {
            return Err(FlowError::PinNotFound {
                node: cursor,
                index: pin,
            });
        }

        let explored = self
            .shadowed_operation(|player| player.explore_from(cursor, Some(pin)))
            .ok_or(FlowError::ShadowLimitReached {
                limit: self.config.shadow_level_limit,
            })?;
        self.expose(explored);

        match self.first_valid_branch() {
            Some(branch) => {
                self.commit(&branch, Some(pin))?;
                Ok(true)
            }
            None => {
                tracing::debug!(node = %cursor, pin, "no valid branch through pin");
                Ok(false)
            }
        }
    }

    /// Run `operation` with every variable snapshotted, restoring them
    /// afterwards even if the operation panics.
    ///
    /// Returns `None` without running the operation when the shadow level
    /// limit is reached.
    pub fn shadowed_operation<R>(&mut self, operation: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.shadow_level >= self.config.shadow_level_limit {
            tracing::warn!(
                level = self.shadow_level,
                limit = self.config.shadow_level_limit,
                "shadow level limit reached, skipping operation"
            );
            return None;
        }

        let mut scope = PlayerShadowScope::enter(self);
        Some(operation(&mut *scope))
    }

    // ==================== INTERNALS ====================

    fn require_node(&self, id: NodeId) -> Result<&Node, FlowError> {
        self.graph.node(id).ok_or(FlowError::NodeNotFound(id))
    }

    fn explore_from(&mut self, start: NodeId, only_pin: Option<usize>) -> Vec<Branch> {
        let explorer = BranchExplorer::new(
            &self.graph,
            &self.script,
            self.config.pause_on,
            self.config.explore_limit,
        )
        .start_executed(self.cursor_executed);
        match only_pin {
            Some(pin) => explorer.explore_through_pin(start, pin, &mut self.variables),
            None => explorer.explore(start, &mut self.variables),
        }
    }

    /// Store explored branches, dropping invalid ones if configured.
    fn expose(&mut self, explored: Vec<Branch>) {
        let mut branches: Vec<Branch> = if self.config.ignore_invalid_branches {
            explored.into_iter().filter(Branch::is_valid).collect()
        } else {
            explored
        };
        for (index, branch) in branches.iter_mut().enumerate() {
            branch.set_index(index);
        }

        tracing::debug!(count = branches.len(), "available branches updated");
        self.events.push(FlowEvent::BranchesUpdated {
            count: branches.len(),
        });
        self.branches = branches;
        self.branches_ready = true;
        self.paused = false;
    }

    fn first_valid_branch(&self) -> Option<Branch> {
        self.branches.iter().find(|branch| branch.is_valid()).cloned()
    }

    fn invalidate_branches(&mut self) {
        self.branches.clear();
        self.branches_ready = false;
    }

    fn move_cursor(&mut self, cursor: Option<NodeId>) {
        self.cursor = cursor;
        self.cursor_executed = false;
        self.paused = false;
        self.invalidate_branches();
        tracing::debug!(cursor = ?cursor, "cursor moved");
        self.events.push(FlowEvent::CursorChanged { node: cursor });
    }

    fn pause_at(&mut self, node: NodeId) {
        self.paused = true;
        tracing::debug!(node = %node, "paused");
        self.events.push(FlowEvent::Paused { node });
    }

    fn commit(&mut self, branch: &Branch, first_pin: Option<usize>) -> Result<(), FlowError> {
        if !branch.is_valid() {
            return Err(FlowError::InvalidBranch);
        }
        let (Some(origin), Some(target)) = (branch.origin(), branch.target()) else {
            return Err(FlowError::InvalidBranch);
        };
        if self.cursor != Some(origin) {
            return Err(FlowError::StaleBranch {
                expected: self.cursor,
                found: origin,
            });
        }

        tracing::debug!(from = %origin, to = %target, nodes = branch.len(), "playing branch");
        let executed = self.commit_path(branch.path(), first_pin);

        self.move_cursor(Some(target));
        self.cursor_executed = executed;
        let pause = self
            .graph
            .node(target)
            .is_some_and(|node| self.config.pause_on.matches(node));
        if pause {
            self.pause_at(target);
        }
        Ok(())
    }

    /// Execute the instructions along a path against the real store and
    /// return whether the last node's own instruction has now run.
    ///
    /// Mirrors exploration: instruction nodes run their expression, and the
    /// output pin leading to the next node runs its instruction. The
    /// pause-worthy last node runs nothing, and neither does a first node
    /// whose instruction already ran on arrival. `first_pin` selects the pin
    /// leaving the first node when several lead to the same place.
    fn commit_path(&mut self, path: &[NodeId], first_pin: Option<usize>) -> bool {
        let start_executed = self.cursor_executed;
        let graph = &self.graph;
        let script = &self.script;
        let variables = &mut self.variables;
        let pause_on = self.config.pause_on;
        let mut last_executed = false;

        for (i, &id) in path.iter().enumerate() {
            let Some(node) = graph.node(id) else {
                tracing::warn!(node = %id, "played path reached a missing node");
                break;
            };
            if node.is_jump() {
                continue;
            }
            if i > 0 && pause_on.matches(node) {
                break;
            }

            if let NodeKind::Instruction { expression } = &node.kind {
                if !expression.trim().is_empty() && (i > 0 || !start_executed) {
                    execute_or_skip(script, expression, &mut *variables);
                }
            }

            let Some(next) = path.get(i + 1).copied() else {
                last_executed = true;
                break;
            };
            let pins = graph.output_pins(id);
            let pin = match first_pin.filter(|_| i == 0) {
                Some(index) => pins.iter().find(|pin| pin.index == index),
                None => pins.iter().find(|pin| pin.leads_to(next)),
            };
            if let Some(instruction) = pin.and_then(|pin| pin.instruction()) {
                execute_or_skip(script, instruction, &mut *variables);
            }
        }
        last_executed
    }
}

/// Shadow scope over a whole player: snapshots the store, tracks the
/// player's shadow level and raises the start/end events.
struct PlayerShadowScope<'p, G: DialogueGraph, S: ScriptEngine> {
    player: &'p mut FlowPlayer<G, S>,
    level: u32,
}

impl<'p, G: DialogueGraph, S: ScriptEngine> PlayerShadowScope<'p, G, S> {
    fn enter(player: &'p mut FlowPlayer<G, S>) -> Self {
        player.shadow_level += 1;
        let level = player.shadow_level;
        player.variables.push_state(level);
        player.events.push(FlowEvent::ShadowOperationStarted { level });
        Self { player, level }
    }
}

impl<G: DialogueGraph, S: ScriptEngine> Deref for PlayerShadowScope<'_, G, S> {
    type Target = FlowPlayer<G, S>;

    fn deref(&self) -> &Self::Target {
        self.player
    }
}

impl<G: DialogueGraph, S: ScriptEngine> DerefMut for PlayerShadowScope<'_, G, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.player
    }
}

impl<G: DialogueGraph, S: ScriptEngine> Drop for PlayerShadowScope<'_, G, S> {
    fn drop(&mut self) {
        self.player
            .events
            .push(FlowEvent::ShadowOperationEnded { level: self.level });
        self.player.variables.pop_state(self.level);
        self.player.shadow_level = self.level - 1;
    }
}
