//! Auto-fix engine, section 4.6: turns diagnostics with an attached `Fix`
//! into `Edit`s and runs the multipass loop to a fixed point. The
//! `Position.length` convention lives here: `None` is a pure insertion at
//! that point, `Some(n)` replaces `n` characters on the same line starting
//! there — see `DESIGN.md`'s "Fix-application convention" entry for why.

use diagramlint_core::{apply_edits, Diagnostic, Diagnostics, Edit, Position};

pub const MAX_PASSES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixLevel {
    Safe,
    All,
}

/// Codes whose only documented fix is unsafe to apply automatically, per
/// §4.6's explicit "deliberately NOT auto-fixed" carve-out.
const NEVER_FIX: &[&str] =
    &["SE-LABEL-DOUBLE-IN-DOUBLE", "PI-LABEL-DOUBLE-IN-DOUBLE", "FL-LABEL-DOUBLE-IN-DOUBLE"];

/// Codes §4.6 tags `(all)`: their fix is deterministic but only heuristic
/// enough to apply under `FixLevel::All`, never under the default `Safe`.
const ALL_ONLY_FIX: &[&str] = &[
    "FL-NODE-UNCLOSED-BRACKET",
    "FL-LINK-MISSING",
    "PI-QUOTE-UNCLOSED",
    "SE-AUTONUMBER-MALFORMED",
    "SE-QUOTE-UNCLOSED",
];

fn diagnostic_to_edit(diag: &Diagnostic) -> Option<Edit> {
    let fix = diag.fix.as_ref()?;
    if let Some(code) = diag.code.as_deref() {
        if NEVER_FIX.contains(&code) {
            return None;
        }
    }
    let start = diag.position;
    let end = match start.length {
        Some(n) => Position::new(start.line, start.column + n),
        None => start,
    };
    Some(Edit::new(start, end, fix.replacement.clone()))
}

/// Runs `parse` repeatedly, applying generated edits, until no edits are
/// produced, the text stops changing, or `MAX_PASSES` is reached.
///
/// `parse` re-validates from scratch each pass (this notation's parsers are
/// cheap enough that incremental reparse is not worth the complexity), the
/// same "validate, don't patch the tree" approach as the rest of the
/// pipeline.
pub fn fix_to_fixed_point(
    source: &str,
    level: FixLevel,
    mut parse: impl FnMut(&str) -> Diagnostics,
) -> (String, Diagnostics) {
    let mut text = source.to_string();
    let mut diags = parse(&text);

    for _ in 0..MAX_PASSES {
        let edits: Vec<Edit> = diags
            .iter()
            .filter(|d| level == FixLevel::All || is_safe(d))
            .filter_map(diagnostic_to_edit)
            .collect();

        if edits.is_empty() {
            break;
        }

        let next = apply_edits(&text, &edits);
        if next == text {
            break;
        }
        text = next;
        diags = parse(&text);
    }

    (text, diags)
}

/// A fix is safe unless its code is tagged `(all)` in §4.6 — those are
/// deterministic but reserved for the heuristic `all` level.
fn is_safe(diag: &Diagnostic) -> bool {
    match diag.code.as_deref() {
        Some(code) => !ALL_ONLY_FIX.contains(&code),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::Fix;

    fn fake_parse(text: &str) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if let Some(idx) = text.find("->") {
            if !text[idx..].starts_with("-->") {
                let before = &text[..idx];
                let line = before.matches('\n').count() as u32 + 1;
                let col = (idx - before.rfind('\n').map(|i| i + 1).unwrap_or(0)) as u32 + 1;
                diags
                    .error(Position::new(line, col).with_length(2), "bad arrow")
                    .code("FL-ARROW-INVALID")
                    .fix(Fix::new("-->", "use a solid arrow"))
                    .emit();
            }
        }
        diags
    }

    #[test]
    fn fixes_to_a_clean_fixed_point() {
        let (fixed, diags) = fix_to_fixed_point("flowchart TD\nA -> B\n", FixLevel::Safe, fake_parse);
        assert_eq!(fixed, "flowchart TD\nA --> B\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn stops_when_no_edits_are_generated() {
        let (fixed, diags) = fix_to_fixed_point("flowchart TD\nA --> B\n", FixLevel::Safe, fake_parse);
        assert_eq!(fixed, "flowchart TD\nA --> B\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn never_fix_codes_are_left_untouched() {
        let mut diags = Diagnostics::new();
        diags
            .error(Position::new(1, 1), "unsafe")
            .code("PI-LABEL-DOUBLE-IN-DOUBLE")
            .fix(Fix::new("x", "would be unsafe"))
            .emit();
        let edit = diagnostic_to_edit(&diags.as_slice()[0]);
        assert!(edit.is_none());
    }

    #[test]
    fn all_only_codes_are_gated_by_level() {
        let mut diags = Diagnostics::new();
        diags
            .error(Position::new(1, 1), "missing closer")
            .code("FL-NODE-UNCLOSED-BRACKET")
            .fix(Fix::new("]", "insert the matching closer"))
            .emit();
        assert!(!is_safe(&diags.as_slice()[0]));

        let edit = diagnostic_to_edit(&diags.as_slice()[0]);
        assert!(edit.is_some(), "an (all)-only code still produces an edit; FixLevel gating happens in fix_to_fixed_point");
    }
}
