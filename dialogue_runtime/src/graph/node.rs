//! Node, pin and edge definitions.

use serde::{Deserialize, Serialize};

use super::{NodeId, PinId};

/// Text payload of a spoken line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineData {
    pub speaker: Option<String>,
    pub text: String,
    /// Shorter text shown when the line is offered as a choice.
    pub menu_text: Option<String>,
    pub stage_directions: Option<String>,
}

/// Payload of a container node (a flow fragment grouping other nodes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerData {
    pub display_name: String,
    pub description: Option<String>,
}

impl Default for ContainerData {
    fn default() -> Self {
        Self {
            display_name: "Flow Fragment".to_string(),
            description: None,
        }
    }
}

/// What a node does when the flow reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodeKind {
    /// A spoken line.
    Line(LineData),

    /// A choice point whose outputs fan out to alternatives.
    Hub { display_name: Option<String> },

    /// Continues through output pin 0 when the expression holds, pin 1 otherwise.
    Condition { expression: String },

    /// Runs its expression when the flow passes through.
    Instruction { expression: String },

    /// Unconditional redirect to an input pin of another node.
    Jump { target: NodeId, pin_index: usize },

    /// A flow fragment grouping other nodes.
    Container(ContainerData),
}

impl NodeKind {
    pub fn line(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        NodeKind::Line(LineData {
            speaker: Some(speaker.into()),
            text: text.into(),
            ..LineData::default()
        })
    }

    pub fn hub() -> Self {
        NodeKind::Hub { display_name: None }
    }

    pub fn condition(expression: impl Into<String>) -> Self {
        NodeKind::Condition {
            expression: expression.into(),
        }
    }

    pub fn instruction(expression: impl Into<String>) -> Self {
        NodeKind::Instruction {
            expression: expression.into(),
        }
    }

    pub fn jump(target: NodeId, pin_index: usize) -> Self {
        NodeKind::Jump { target, pin_index }
    }

    pub fn container(display_name: impl Into<String>) -> Self {
        NodeKind::Container(ContainerData {
            display_name: display_name.into(),
            description: None,
        })
    }

    /// The classification matched against a player's pause mask.
    pub fn pausable_kind(&self) -> PausableKind {
        match self {
            NodeKind::Line(_) => PausableKind::Line,
            NodeKind::Hub { .. } => PausableKind::Hub,
            NodeKind::Condition { .. } => PausableKind::Condition,
            NodeKind::Instruction { .. } => PausableKind::Instruction,
            NodeKind::Jump { .. } => PausableKind::Jump,
            NodeKind::Container(_) => PausableKind::Container,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Line(_) => "Line",
            NodeKind::Hub { .. } => "Hub",
            NodeKind::Condition { .. } => "Condition",
            NodeKind::Instruction { .. } => "Instruction",
            NodeKind::Jump { .. } => "Jump",
            NodeKind::Container(_) => "Container",
        }
    }
}

/// Node classification used by pause masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausableKind {
    Container = 0,
    Line = 1,
    Hub = 2,
    Jump = 3,
    Condition = 4,
    Instruction = 5,
}

impl PausableKind {
    pub const ALL: [PausableKind; 6] = [
        PausableKind::Container,
        PausableKind::Line,
        PausableKind::Hub,
        PausableKind::Jump,
        PausableKind::Condition,
        PausableKind::Instruction,
    ];

    /// The bit representing this kind in a pause mask.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// An edge from an output pin to an input pin of another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub target_node: NodeId,
    pub target_pin: usize,
}

/// Input pin; may carry a guard gating entry through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPin {
    pub id: PinId,
    pub owner: NodeId,
    pub index: usize,
    pub guard: Option<String>,
    pub label: Option<String>,
}

impl InputPin {
    pub fn new(owner: NodeId, index: usize) -> Self {
        Self {
            id: PinId::new(),
            owner,
            index,
            guard: None,
            label: None,
        }
    }

    /// The guard expression, ignoring blank scripts.
    pub fn guard(&self) -> Option<&str> {
        non_blank(self.guard.as_deref())
    }
}

/// Output pin; may carry an instruction and any number of edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPin {
    pub id: PinId,
    pub owner: NodeId,
    pub index: usize,
    pub instruction: Option<String>,
    pub label: Option<String>,
    pub edges: Vec<Edge>,
}

impl OutputPin {
    pub fn new(owner: NodeId, index: usize) -> Self {
        Self {
            id: PinId::new(),
            owner,
            index,
            instruction: None,
            label: None,
            edges: Vec::new(),
        }
    }

    /// The instruction expression, ignoring blank scripts.
    pub fn instruction(&self) -> Option<&str> {
        non_blank(self.instruction.as_deref())
    }

    pub fn leads_to(&self, node: NodeId) -> bool {
        self.edges.iter().any(|edge| edge.target_node == node)
    }
}

fn non_blank(script: Option<&str>) -> Option<&str> {
    script.filter(|s| !s.trim().is_empty())
}

/// A node in a dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Stable name for scripting and debugging.
    pub technical_name: String,
    pub kind: NodeKind,
    pub input_pins: Vec<InputPin>,
    pub output_pins: Vec<OutputPin>,
}

impl Node {
    /// Create a node with the default pin layout for its kind: one input,
    /// and no outputs for jumps, true/false outputs for conditions, one
    /// output otherwise.
    pub fn new(kind: NodeKind) -> Self {
        let id = NodeId::new();
        let short_id: String = id.to_string().chars().take(8).collect();
        let technical_name = format!("{}_{}", kind.display_name().to_lowercase(), short_id);

        let output_labels: Vec<Option<String>> = match kind {
            NodeKind::Jump { .. } => Vec::new(),
            NodeKind::Condition { .. } => vec![Some("True".to_string()), Some("False".to_string())],
            _ => vec![None],
        };

        let output_pins = output_labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| OutputPin {
                label,
                ..OutputPin::new(id, index)
            })
            .collect();

        Self {
            id,
            technical_name,
            kind,
            input_pins: vec![InputPin::new(id, 0)],
            output_pins,
        }
    }

    pub fn pausable_kind(&self) -> PausableKind {
        self.kind.pausable_kind()
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.kind, NodeKind::Jump { .. })
    }

    /// Whether any output pin has at least one edge.
    pub fn has_outgoing_edges(&self) -> bool {
        self.output_pins.iter().any(|pin| !pin.edges.is_empty())
    }

    /// Text of a line node, if this is one.
    pub fn line(&self) -> Option<&LineData> {
        match &self.kind {
            NodeKind::Line(line) => Some(line),
            _ => None,
        }
    }
}
