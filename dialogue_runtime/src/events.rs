//! Notifications raised by the flow player.
//!
//! Events are queued on the player and collected with
//! [`FlowPlayer::drain_events`](crate::FlowPlayer::drain_events), typically
//! once per frame by the presentation layer.

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    /// The cursor moved (or was cleared).
    CursorChanged { node: Option<NodeId> },

    /// The exposed branch list was recomputed.
    BranchesUpdated { count: usize },

    /// The flow stopped on a node the caller should present.
    Paused { node: NodeId },

    ShadowOperationStarted { level: u32 },
    ShadowOperationEnded { level: u32 },
}

impl FlowEvent {
    pub fn is_shadow_event(&self) -> bool {
        matches!(
            self,
            FlowEvent::ShadowOperationStarted { .. } | FlowEvent::ShadowOperationEnded { .. }
        )
    }
}
