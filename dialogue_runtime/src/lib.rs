//! # Dialogue Runtime
//!
//! Walks dialogue graphs for a game. A [`FlowPlayer`] keeps a cursor inside a
//! graph, discovers the branches reachable from it by running guards and
//! instructions speculatively, and commits the branch the caller picks.
//!
//! ## Core Components
//!
//! - **graph**: nodes, pins and edges, the [`DialogueGraph`] trait and the
//!   in-memory [`FlowGraph`]
//! - **script**: the [`ScriptEngine`] capability and its Rhai backend
//! - **flow**: branches, the branch explorer, player configuration and the
//!   flow player itself
//! - **events**: notifications raised by the player
//!
//! ## Design Philosophy
//!
//! - **Speculate, then commit**: exploration runs inside a shadow scope of the
//!   variable store, so nothing it does survives; playing a branch re-runs the
//!   same path for real.
//! - **Fail closed**: broken edges and failing scripts invalidate a branch
//!   instead of aborting traversal.
//! - **Bounded**: exploration depth and shadow nesting both have hard limits,
//!   so the player is safe to drive from a per-frame update loop.

pub mod error;
pub mod events;
pub mod flow;
pub mod graph;
pub mod script;

pub use error::*;
pub use events::*;
pub use flow::*;
pub use graph::*;
pub use script::*;

pub use dialogue_state::{StateError, VariableStore, VariableValue};
