use indexmap::{IndexMap, IndexSet};

use super::flowchart::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StateNodeKind {
    Simple,
    Composite,
    Start,
    End,
    History,
    HistoryDeep,
    Choice,
    Fork,
    Join,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateNode {
    pub id: String,
    pub label: Option<String>,
    pub kind: StateNodeKind,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Composite {
    pub id: String,
    pub label: Option<String>,
    pub members: IndexSet<String>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Lane {
    pub parent: String,
    pub lane_id: String,
    pub members: IndexSet<String>,
}

impl Lane {
    /// Lane ids encode their parent, e.g. `parent#lane2`.
    pub fn qualified_id(&self) -> String {
        format!("{}#{}", self.parent, self.lane_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateDiagram {
    pub direction: Option<Direction>,
    pub nodes: IndexMap<String, StateNode>,
    pub transitions: Vec<Transition>,
    pub composites: IndexMap<String, Composite>,
    pub lanes: Vec<Lane>,
}

/// Synthesizes a stable id for a start/end/history pseudo-state at a given
/// occurrence index, since `[*]` and history markers carry no source name.
pub fn synthetic_pseudo_id(kind: StateNodeKind, occurrence: usize) -> String {
    let tag = match kind {
        StateNodeKind::Start => "start",
        StateNodeKind::End => "end",
        StateNodeKind::History => "history",
        StateNodeKind::HistoryDeep => "historyDeep",
        StateNodeKind::Choice => "choice",
        StateNodeKind::Fork => "fork",
        StateNodeKind::Join => "join",
        StateNodeKind::Simple | StateNodeKind::Composite => "node",
    };
    format!("__{tag}{occurrence}")
}
