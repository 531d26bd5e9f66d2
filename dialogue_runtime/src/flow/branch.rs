//! Explored paths offered to the caller.

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// A candidate path discovered by exploration.
///
/// The path always holds at least the node exploration started from; its
/// last node is where the cursor lands when the branch is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    path: Vec<NodeId>,
    is_valid: bool,
    index: usize,
}

impl Branch {
    pub(crate) fn new(path: Vec<NodeId>, is_valid: bool) -> Self {
        debug_assert!(!path.is_empty(), "branch path must not be empty");
        Self {
            path,
            is_valid,
            index: 0,
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Visited nodes in order, starting at the exploration origin.
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    /// Whether the path can be played. Invalid branches end at a failed
    /// guard, a missing node or the explore limit.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Position among the branches currently exposed by the player.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The node the cursor moves to when this branch is played.
    pub fn target(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    pub fn origin(&self) -> Option<NodeId> {
        self.path.first().copied()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}
