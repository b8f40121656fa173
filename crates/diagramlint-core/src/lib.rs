//! Shared value types for diagramlint: positions, diagnostics, edits, the
//! per-family domain models, layout geometry and frontmatter. This crate
//! owns no parsing or rendering logic; it is the vocabulary the syntax and
//! render crates share.

pub mod diagnostic;
pub mod edit;
pub mod error;
pub mod frontmatter;
pub mod kind;
pub mod model;
pub mod position;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Diagnostics, Fix, RelatedInfo, Severity};
pub use edit::{apply_edits, Edit};
pub use error::Error;
pub use frontmatter::{Config, ConfigValue, Frontmatter, PieConfig};
pub use kind::DiagramKind;
pub use model::Diagram;
pub use position::Position;
