//! Human-readable diagnostic report, section 4.12. Uses a `.source()`/
//! `.path()`/`.render()` builder, with the body hand-written instead of
//! delegating to `annotate_snippets` — that crate renders byte ranges over
//! a rowan tree, but diagnostics here carry 1-based line/column positions
//! with no backing CST, so a purpose-built code-frame writer is simpler
//! than bridging the two.

use std::fmt::Write;

use diagramlint_core::{Diagnostic, Diagnostics, Severity};

pub struct HumanReportPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: &'s str,
    path: Option<&'s str>,
}

impl<'d, 's> HumanReportPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics, source: &'s str) -> Self {
        Self { diagnostics, source, path: None }
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let lines: Vec<&str> = self.source.lines().collect();
        let file = self.path.unwrap_or("<stdin>");

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            writeln!(out, "{diag}").unwrap();
            writeln!(out, "  at {file}:{}", diag.position).unwrap();
            write_frame(&mut out, &lines, diag);
            if let Some(hint) = &diag.hint {
                writeln!(out, "  hint: {hint}").unwrap();
            }
        }

        out
    }
}

fn write_frame(out: &mut String, lines: &[&str], diag: &Diagnostic) {
    let line_no = diag.position.line as usize;
    let is_structural_insert =
        diag.code.as_deref().is_some_and(|c| c.contains("MISSING-END") || c.contains("MISSING-RBRACE"));

    if is_structural_insert {
        // The opening line of the unclosed construct isn't known at this
        // layer (only the diagnostic's own insertion point is); point
        // straight at the insertion line with an arrow rather than
        // fabricating a reference to an opener this printer can't see.
        if let Some(text) = lines.get(line_no.saturating_sub(1)) {
            writeln!(out, "  {:>4} | {}", line_no, text).unwrap();
        }
        writeln!(out, "       | ^ insert here").unwrap();
        return;
    }

    for offset in [-1i64, 0, 1] {
        let target = line_no as i64 + offset;
        if target < 1 {
            continue;
        }
        let Some(text) = lines.get((target - 1) as usize) else { continue };
        writeln!(out, "  {:>4} | {}", target, text).unwrap();
        if offset == 0 {
            let underline_len = diag.position.length.unwrap_or(1).max(1) as usize;
            let pad = " ".repeat((diag.position.column.saturating_sub(1)) as usize);
            writeln!(out, "       | {}{}", pad, "^".repeat(underline_len)).unwrap();
        }
    }
}

pub fn render_report(diagnostics: &Diagnostics, source: &str, path: Option<&str>) -> String {
    let mut printer = HumanReportPrinter::new(diagnostics, source);
    if let Some(p) = path {
        printer = printer.path(p);
    }
    printer.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::{Fix, Position};

    #[test]
    fn report_includes_header_location_and_caret() {
        let mut diags = Diagnostics::new();
        diags
            .error(Position::new(2, 3).with_length(2), "'->' is not a valid arrow")
            .code("FL-ARROW-INVALID")
            .fix(Fix::new("-->", "use a solid arrow"))
            .emit();
        let report = render_report(&diags, "flowchart TD\nA -> B\n", Some("diagram.mmd"));
        assert!(report.contains("error[FL-ARROW-INVALID]"));
        assert!(report.contains("at diagram.mmd:2:3"));
        assert!(report.contains("^^"));
    }

    #[test]
    fn structural_insertion_points_at_insertion_line() {
        let mut diags = Diagnostics::new();
        diags
            .error(Position::new(4, 1), "sequence block is missing its 'end'")
            .code("SE-BLOCK-MISSING-END")
            .emit();
        let report = render_report(&diags, "sequenceDiagram\npar Do work\n  A->B: hi\n", Some("s.mmd"));
        assert!(report.contains("insert here"));
    }

    #[test]
    fn empty_diagnostics_render_to_empty_string() {
        let diags = Diagnostics::new();
        assert_eq!(render_report(&diags, "pie\n", None), "");
    }

    #[test]
    fn warning_severity_is_labeled() {
        let mut diags = Diagnostics::new();
        diags.warning(Position::new(1, 1), "escaped quote").code("FL-LABEL-ESCAPED-QUOTE").emit();
        let report = render_report(&diags, "flowchart TD\n", None);
        assert!(report.starts_with("warning[FL-LABEL-ESCAPED-QUOTE]"));
    }
}
