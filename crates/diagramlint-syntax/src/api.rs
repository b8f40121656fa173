//! The public programmatic API, section 6: a thin facade over the router,
//! parsers, auto-fix engine, formatters, and renderer, matching the
//! `validate`/`fix`/`render`/`detectType`/`extractBlocks`/
//! `offsetDiagnostics`/`toJson` surface the CLI and embedders both call
//! through.

use diagramlint_core::frontmatter::Frontmatter;
use diagramlint_core::model::Diagram;
use diagramlint_core::{DiagramKind, Diagnostics};
use diagramlint_render::{RenderOptions, RenderOutput};
use serde_json::Value;

use crate::fixengine::{self, FixLevel};
use crate::{frontmatter_reader, markdown, router};

pub struct ValidateResult {
    pub kind: DiagramKind,
    pub diagnostics: Diagnostics,
    pub frontmatter: Option<Frontmatter>,
}

/// Parses `text` and collects every diagnostic a single pass produces.
/// `strict` has no effect on which diagnostics are produced — every
/// diagnostic this crate emits already carries a fixed severity — but is
/// threaded through for callers that want to treat warnings as failures
/// at the reporting layer (see `to_json`/exit-code mapping in the CLI).
pub fn validate(text: &str, _strict: bool) -> ValidateResult {
    let (frontmatter, body) = frontmatter_reader::read_frontmatter(text);
    let (_model, mut diagnostics) = crate::parse(body);
    let kind = router::detect_type(body);
    if frontmatter.is_some() {
        let shift = text.lines().count() as i64 - body.lines().count() as i64;
        if shift != 0 {
            diagnostics = diagnostics.offset_lines(shift);
        }
    }
    ValidateResult { kind, diagnostics, frontmatter }
}

pub struct FixResult {
    pub fixed: String,
    pub diagnostics: Diagnostics,
}

/// Runs the auto-fix engine to a fixed point over `text`'s diagram body,
/// re-attaching any frontmatter prefix untouched (fixes never touch
/// frontmatter, §4.6).
pub fn fix(text: &str, level: FixLevel) -> FixResult {
    let (frontmatter, body) = frontmatter_reader::read_frontmatter(text);
    let prefix = frontmatter.as_ref().map(|f| f.raw.clone()).unwrap_or_default();
    let (fixed_body, diagnostics) = fixengine::fix_to_fixed_point(body, level, |src| crate::parse(src).1);
    FixResult { fixed: format!("{prefix}{fixed_body}"), diagnostics }
}

pub struct RenderResult {
    pub vector: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Parses and renders `text`; when parsing fails to produce a model (an
/// unrecognized header), `vector` is `None` and the diagnostics explain
/// why, per §6's "render never panics on invalid input" contract.
pub fn render(text: &str, options: &RenderOptions) -> RenderResult {
    let (frontmatter, body) = frontmatter_reader::read_frontmatter(text);
    let (model, diagnostics) = crate::parse(body);
    let vector = model.as_ref().map(|m: &Diagram| {
        let RenderOutput { vector, .. } = diagramlint_render::render(m, frontmatter.as_ref(), options);
        vector
    });
    RenderResult { vector, diagnostics }
}

pub fn detect_type(text: &str) -> DiagramKind {
    let (_frontmatter, body) = frontmatter_reader::read_frontmatter(text);
    router::detect_type(body)
}

pub fn extract_blocks(text: &str) -> Vec<markdown::ExtractedBlock> {
    markdown::extract_blocks(text)
}

pub fn offset_diagnostics(diagnostics: &Diagnostics, offset: i64) -> Diagnostics {
    diagnostics.offset_lines(offset)
}

pub fn to_text(diagnostics: &Diagnostics, source: &str, path: Option<&str>) -> String {
    crate::format::render_report(diagnostics, source, path)
}

pub fn to_json(file: &str, diagnostics: &Diagnostics) -> Value {
    crate::format::to_json(file, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_detects_flowchart_kind() {
        let result = validate("flowchart TD\nA --> B\n", false);
        assert_eq!(result.kind, DiagramKind::Flowchart);
    }

    #[test]
    fn validate_unknown_header_reports_gen_header_invalid() {
        let result = validate("not a diagram\n", false);
        assert!(result.diagnostics.iter().any(|d| d.code.as_deref() == Some("GEN-HEADER-INVALID")));
    }

    #[test]
    fn render_returns_svg_for_a_valid_pie() {
        let result = render("pie\n\"A\" : 1\n", &RenderOptions::default());
        assert!(result.vector.unwrap().contains("<svg"));
    }

    #[test]
    fn render_returns_none_for_unrecognized_input() {
        let result = render("not a diagram\n", &RenderOptions::default());
        assert!(result.vector.is_none());
    }

    #[test]
    fn extract_blocks_delegates_to_markdown_module() {
        let blocks = extract_blocks("```mermaid\npie\n\"A\" : 1\n```\n");
        assert_eq!(blocks.len(), 1);
    }
}
