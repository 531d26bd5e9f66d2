//! Error types for graph building, scripting and playback.
//!
//! Traversal itself never fails with these: broken edges, failing scripts and
//! exceeded limits are recovered during exploration and only logged. The
//! errors below are returned by commands whose preconditions do not hold.

use dialogue_state::StateError;
use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised by a [`ScriptEngine`](crate::ScriptEngine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Failed to run '{expression}': {message}")]
    Evaluation { expression: String, message: String },

    #[error("Guard '{expression}' produced a {found} instead of a bool")]
    NotBoolean { expression: String, found: String },

    #[error("Script '{expression}' wrote an invalid value: {source}")]
    WriteBack {
        expression: String,
        #[source]
        source: StateError,
    },
}

/// Errors returned by flow player commands and graph editing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Node '{0}' not found in the dialogue graph")]
    NodeNotFound(NodeId),

    #[error("Node '{node}' has no pin with index {index}")]
    PinNotFound { node: NodeId, index: usize },

    #[error("Pin {pin} of node '{from}' is already connected to pin {target_pin} of '{to}'")]
    DuplicateEdge {
        from: NodeId,
        pin: usize,
        to: NodeId,
        target_pin: usize,
    },

    #[error("The flow player has no cursor")]
    NoCursor,

    #[error("No start node configured")]
    NoStartNode,

    #[error("Branch index {index} is out of range ({available} available)")]
    BranchIndexOutOfRange { index: usize, available: usize },

    #[error("Cannot play an invalid branch")]
    InvalidBranch,

    /// The branch was explored from a different cursor position.
    #[error("Branch starts at '{found}' but the cursor is at {expected:?}")]
    StaleBranch {
        expected: Option<NodeId>,
        found: NodeId,
    },

    #[error("Shadow level limit of {limit} reached, operation skipped")]
    ShadowLimitReached { limit: u32 },

    #[error("Invalid flow player configuration: {0}")]
    Config(String),

    #[error("Variable store error: {0}")]
    State(#[from] StateError),
}
