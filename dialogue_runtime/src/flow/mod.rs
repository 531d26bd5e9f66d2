//! Flow traversal: branches, exploration and the flow player.
//!
//! Playback alternates between two phases:
//! 1. **Explore**: starting at the cursor, walk the graph until every path
//!    reaches a pause point, a dead end or a failed guard. Runs inside a
//!    shadow scope, so instructions executed on the way are rolled back.
//! 2. **Commit**: the caller picks one branch and the player re-runs its
//!    path for real, then moves the cursor to the branch's last node.

mod branch;
mod config;
mod explorer;
mod pause;
mod player;

pub use branch::*;
pub use config::*;
pub use explorer::*;
pub use pause::*;
pub use player::*;
