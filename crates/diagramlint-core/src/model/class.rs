use indexmap::IndexMap;

use super::flowchart::Direction;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Class {
    pub id: String,
    pub display: String,
    pub stereotype: Option<String>,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
}

impl Class {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { display: id.clone(), id, stereotype: None, attributes: Vec::new(), methods: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RelationKind {
    Association,
    Dependency,
    Realization,
    Extends,
    Aggregation,
    Composition,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub label: Option<String>,
    pub source_cardinality: Option<String>,
    pub target_cardinality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassDiagram {
    pub direction: Option<Direction>,
    pub classes: IndexMap<String, Class>,
    pub relations: Vec<Relation>,
}

impl ClassDiagram {
    /// Ensures `id` has a declared class entry, auto-creating a bare one
    /// when a relation references it before (or without) a declaration.
    pub fn ensure_class(&mut self, id: &str) -> &mut Class {
        self.classes.entry(id.to_string()).or_insert_with(|| Class::new(id))
    }
}
