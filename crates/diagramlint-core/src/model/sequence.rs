use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Participant {
    pub id: String,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LineStyle {
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MessageMarker {
    None,
    Arrow,
    Open,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
    pub line_style: LineStyle,
    pub start_marker: MessageMarker,
    pub end_marker: MessageMarker,
    pub is_async: bool,
    pub activates_target: bool,
    pub deactivates_source: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NoteAnchor {
    LeftOf,
    RightOf,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    pub anchor: NoteAnchor,
    pub targets: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BlockKind {
    Alt,
    Opt,
    Loop,
    Par,
    Critical,
    Break,
    Rect,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BranchTag {
    Else,
    And,
    Option,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Branch {
    pub tag: BranchTag,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    Message(Message),
    Note(Note),
    Activate(String),
    Deactivate(String),
    BlockStart { kind: BlockKind, title: Option<String> },
    BlockBranch(Branch),
    BlockEnd,
    Create(String),
    Destroy(String),
    Noop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Autonumber {
    pub on: bool,
    pub start: i64,
    pub step: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    pub participants: IndexMap<String, Participant>,
    pub events: Vec<Event>,
    pub autonumber: Autonumber,
    pub title: Option<String>,
}

impl Sequence {
    /// Every block-start has a matching block-end in event order, the
    /// invariant pinned by the data model.
    pub fn blocks_balanced(&self) -> bool {
        let mut depth: i64 = 0;
        for event in &self.events {
            match event {
                Event::BlockStart { .. } => depth += 1,
                Event::BlockEnd => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }
}
