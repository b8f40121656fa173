use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Flowchart,
    Pie,
    Sequence,
    Class,
    State,
    Unknown,
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::Pie => "pie",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
            DiagramKind::State => "state",
            DiagramKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl DiagramKind {
    /// The family-prefixed diagnostic code prefix used by this kind, per
    /// the FL-/PI-/SE-/CL-/ST-/GEN- scheme.
    pub fn code_prefix(self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "FL",
            DiagramKind::Pie => "PI",
            DiagramKind::Sequence => "SE",
            DiagramKind::Class => "CL",
            DiagramKind::State => "ST",
            DiagramKind::Unknown => "GEN",
        }
    }
}
