use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    TB,
    TD,
    BT,
    LR,
    RL,
}

impl Direction {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "TB" => Some(Direction::TB),
            "TD" => Some(Direction::TD),
            "BT" => Some(Direction::BT),
            "LR" => Some(Direction::LR),
            "RL" => Some(Direction::RL),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeShape {
    Rectangle,
    Round,
    Stadium,
    Cylinder,
    Circle,
    Diamond,
    Hexagon,
    Parallelogram,
    Trapezoid,
    TrapezoidInverted,
    Subroutine,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub style: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ArrowType {
    Arrow,
    Open,
    Dotted,
    Thick,
    Invisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EndMarker {
    None,
    Arrow,
    Circle,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub arrow: ArrowType,
    pub start_marker: EndMarker,
    pub end_marker: EndMarker,
    pub label: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subgraph {
    pub id: String,
    pub label: Option<String>,
    pub members: IndexSet<String>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Flowchart {
    pub direction: Option<Direction>,
    pub nodes: IndexMap<String, Node>,
    pub edges: Vec<Edge>,
    pub subgraphs: IndexMap<String, Subgraph>,
}

impl Flowchart {
    pub fn new(direction: Option<Direction>) -> Self {
        Self { direction, ..Default::default() }
    }

    /// True when every edge endpoint names a declared node, the invariant
    /// required by the data model.
    pub fn edges_resolve(&self) -> bool {
        self.edges.iter().all(|e| self.nodes.contains_key(&e.source) && self.nodes.contains_key(&e.target))
    }

    /// True when the subgraph parent relation forms a forest (no cycles).
    pub fn subgraphs_form_forest(&self) -> bool {
        for id in self.subgraphs.keys() {
            let mut seen = IndexSet::new();
            let mut current = id.clone();
            loop {
                if !seen.insert(current.clone()) {
                    return false;
                }
                match self.subgraphs.get(&current).and_then(|s| s.parent.clone()) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
        true
    }
}
