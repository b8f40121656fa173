//! Router, lexers, parsers, diagnostics and the auto-fix engine for
//! diagramlint. `parse` is the single entry point every other crate
//! (render, cli) calls through; the per-family modules stay private to
//! this crate's public surface except where the facade re-exports a type
//! consumers need to name (`class`/`flowchart`/`pie`/`sequence`/`state`
//! are exported read-only for callers that want the raw per-family
//! parser, e.g. tests and the render crate's model adapters).

pub mod class;
pub mod flowchart;
pub mod pie;
pub mod sequence;
pub mod state;

pub mod api;
pub mod fixengine;
pub mod format;
pub mod frontmatter_reader;
pub mod hygiene;
pub mod lexer;
pub mod markdown;
pub mod offsets;
pub mod parser_core;
pub mod router;

use diagramlint_core::{model::Diagram, DiagramKind, Diagnostics, Position};

/// Runs the router, then the matching family parser, then the shared
/// hygiene sweep, and returns the parsed model alongside every diagnostic
/// in the concatenation order pinned by the concurrency model: parser
/// diagnostics first (they are emitted in discovery order by construction),
/// hygiene diagnostics last.
pub fn parse(source: &str) -> (Option<Diagram>, Diagnostics) {
    let kind = router::detect_type(source);
    let mut diags = Diagnostics::new();

    let model = match kind {
        DiagramKind::Flowchart => {
            let (model, d) = flowchart::parse(source);
            diags.extend(d);
            Some(Diagram::Flowchart(model))
        }
        DiagramKind::Pie => {
            let (model, d) = pie::parse(source);
            diags.extend(d);
            Some(Diagram::Pie(model))
        }
        DiagramKind::Sequence => {
            let (model, d) = sequence::parse(source);
            diags.extend(d);
            Some(Diagram::Sequence(model))
        }
        DiagramKind::Class => {
            let (model, d) = class::parse(source);
            diags.extend(d);
            Some(Diagram::Class(model))
        }
        DiagramKind::State => {
            let (model, d) = state::parse(source);
            diags.extend(d);
            Some(Diagram::State(model))
        }
        DiagramKind::Unknown => {
            diags.error(Position::new(1, 1), "unrecognized diagram header").code("GEN-HEADER-INVALID").emit();
            None
        }
    };

    if kind != DiagramKind::Unknown {
        hygiene::check_unclosed_quotes(source, kind.code_prefix(), &mut diags);
    }
    diags.suppress_uncoded_near_coded();

    (model, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_header_yields_gen_header_invalid() {
        let (model, diags) = parse("ganttDiagram\ntitle x\n");
        assert!(model.is_none());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.as_slice()[0].code.as_deref(), Some("GEN-HEADER-INVALID"));
        assert_eq!(diags.as_slice()[0].position, Position::new(1, 1));
    }

    #[test]
    fn flowchart_source_parses_to_a_model() {
        let (model, diags) = parse("flowchart TD\nA --> B\n");
        assert!(matches!(model, Some(Diagram::Flowchart(_))));
        assert!(diags.is_empty());
    }
}
