//! Node kinds that halt traversal.

use serde::{Deserialize, Serialize};

use crate::graph::{Node, PausableKind};

/// Set of node kinds that halt traversal.
///
/// Serialized as a list of kind names, e.g. `["container", "line"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PausableKind>", into = "Vec<PausableKind>")]
pub struct PauseMask(u8);

impl PauseMask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::from_kinds(PausableKind::ALL)
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = PausableKind>) -> Self {
        Self(kinds.into_iter().fold(0, |bits, kind| bits | kind.bit()))
    }

    pub fn contains(self, kind: PausableKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: PausableKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: PausableKind) {
        self.0 &= !kind.bit();
    }

    pub fn with(mut self, kind: PausableKind) -> Self {
        self.insert(kind);
        self
    }

    /// Whether traversal should halt on this node.
    pub fn matches(self, node: &Node) -> bool {
        self.contains(node.pausable_kind())
    }

    pub fn kinds(self) -> Vec<PausableKind> {
        PausableKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Vec<PausableKind>> for PauseMask {
    fn from(kinds: Vec<PausableKind>) -> Self {
        Self::from_kinds(kinds)
    }
}

impl From<PauseMask> for Vec<PausableKind> {
    fn from(mask: PauseMask) -> Self {
        mask.kinds()
    }
}
