//! Node-shape scanning: the bracket zoo in section 4.3 (rectangle, round,
//! stadium, cylinder, circle, diamond, hexagon, parallelogram, trapezoid
//! variants, subroutine, double) is a set of paired delimiters around
//! bare or quoted text. Scanning it directly against source bytes is
//! simpler and more robust than threading it through the token stream,
//! and section 4.3 leaves the CST shape free to do so.

use diagramlint_core::model::flowchart::NodeShape;

pub struct ShapeScan {
    pub shape: NodeShape,
    /// The raw text between the opener and the point a closer was found
    /// (or end of line, if unclosed).
    pub inner_raw: String,
    pub open_end_offset: usize,
    pub close_start_offset: usize,
    pub close_end_offset: usize,
    pub unclosed: bool,
    /// True when a closer was found but it belongs to a different bracket
    /// type than the opener expects (`[Text)`): the shape is "closed" but
    /// needs its closer rewritten rather than a closer inserted.
    pub mismatched: bool,
}

struct OpenerSpec {
    open: &'static str,
    closers: &'static [(&'static str, NodeShape)],
}

const OPENERS: &[OpenerSpec] = &[
    OpenerSpec { open: "[[[", closers: &[("]]]", NodeShape::Double)] },
    OpenerSpec { open: "[[", closers: &[("]]", NodeShape::Subroutine)] },
    OpenerSpec { open: "[(", closers: &[(")]", NodeShape::Cylinder)] },
    OpenerSpec { open: "([", closers: &[("])", NodeShape::Stadium)] },
    OpenerSpec { open: "((", closers: &[("))", NodeShape::Circle)] },
    OpenerSpec { open: "{{", closers: &[("}}", NodeShape::Hexagon)] },
    OpenerSpec {
        open: "[/",
        closers: &[("/]", NodeShape::Parallelogram), ("\\]", NodeShape::Trapezoid)],
    },
    OpenerSpec {
        open: "[\\",
        closers: &[("/]", NodeShape::TrapezoidInverted), ("\\]", NodeShape::Parallelogram)],
    },
    OpenerSpec { open: "[", closers: &[("]", NodeShape::Rectangle)] },
    OpenerSpec { open: "(", closers: &[(")", NodeShape::Round)] },
    OpenerSpec { open: "{", closers: &[("}", NodeShape::Diamond)] },
];

/// All single-character closers, used to detect a bracket-shape mismatch:
/// an opener whose nearest closer on the line is the WRONG bracket type.
const ALL_SINGLE_CLOSERS: &[&str] = &["]", ")", "}"];

/// Attempts to scan a node shape starting exactly at `offset`. Returns
/// `None` when no recognized opener starts there (the node is a bare
/// reference with no shape).
pub fn scan_shape(source: &str, offset: usize) -> Option<ShapeScan> {
    let rest = &source[offset..];
    let opener = OPENERS.iter().find(|o| rest.starts_with(o.open))?;
    let after_open = offset + opener.open.len();
    let line_end = source[after_open..].find('\n').map(|i| after_open + i).unwrap_or(source.len());
    let search_space = &source[after_open..line_end];

    if let Some((rel, closer_text, shape)) = find_first_closer(search_space, opener.closers) {
        let close_start = after_open + rel;
        let close_end = close_start + closer_text.len();
        return Some(ShapeScan {
            shape,
            inner_raw: source[after_open..close_start].to_string(),
            open_end_offset: after_open,
            close_start_offset: close_start,
            close_end_offset: close_end,
            unclosed: false,
            mismatched: false,
        });
    }

    // No matching closer for this opener's own closer set: check whether a
    // different bracket type closes it (a shape mismatch) before giving up
    // and calling it unclosed.
    let mismatch_closers: Vec<(&str, NodeShape)> =
        ALL_SINGLE_CLOSERS.iter().map(|c| (*c, opener.closers[0].1)).collect();
    if let Some((rel, closer_text, shape)) = find_first_closer(search_space, &mismatch_closers) {
        let close_start = after_open + rel;
        let close_end = close_start + closer_text.len();
        return Some(ShapeScan {
            shape,
            inner_raw: source[after_open..close_start].to_string(),
            open_end_offset: after_open,
            close_start_offset: close_start,
            close_end_offset: close_end,
            unclosed: false,
            mismatched: true,
        });
    }

    Some(ShapeScan {
        shape: opener.closers[0].1,
        inner_raw: source[after_open..line_end].to_string(),
        open_end_offset: after_open,
        close_start_offset: line_end,
        close_end_offset: line_end,
        unclosed: true,
        mismatched: false,
    })
}

fn find_first_closer<'a>(haystack: &str, closers: &[(&'a str, NodeShape)]) -> Option<(usize, &'a str, NodeShape)> {
    let bytes = haystack.as_bytes();
    let mut in_double = false;
    let mut in_single = false;
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch == '\\' && i + 1 < bytes.len() {
            let escaped = bytes[i + 1] as char;
            // A backslash escaping the currently-open quote char, with the
            // shape's own closer sitting right after it, is the
            // escaped-quote-typo pattern (e.g. `["\"]`): the user meant the
            // quote to close here, so let it close instead of protecting it
            // for the rest of the line, which is how an unrelated node's
            // label further along would otherwise get entangled with this
            // one's scan.
            if ((escaped == '"' && in_double) || (escaped == '\'' && in_single))
                && closers.iter().any(|(closer, _)| haystack[i + 2..].starts_with(closer))
            {
                in_double = false;
                in_single = false;
                i += 2;
                continue;
            }
            i += 2;
            continue;
        }
        if ch == '"' && !in_single {
            in_double = !in_double;
        } else if ch == '\'' && !in_double {
            in_single = !in_single;
        } else if !in_double && !in_single {
            for (closer, shape) in closers {
                if haystack[i..].starts_with(closer) {
                    return Some((i, closer, *shape));
                }
            }
        }
        i += 1;
    }
    None
}

/// True when the shape's inner content is empty once outer quoting is
/// stripped and the remainder is trimmed of whitespace and stray escape
/// backslashes. Covers plain empty brackets (`[]`), quote-only content
/// (`[" "]`), and the escaped-empty-quote typo (`["\"]`).
pub fn is_empty_content(inner_raw: &str) -> bool {
    let mut text = inner_raw.trim();
    if text.len() >= 2 {
        let first = text.chars().next().unwrap();
        let last = text.chars().last().unwrap();
        if (first == '"' && last == '"') || (first == '\'' && last == '\'') {
            text = &text[1..text.len() - 1];
        }
    }
    let stripped: String = text.chars().filter(|c| *c != '\\').collect();
    stripped.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_rectangle() {
        let scan = scan_shape("A[Label] --> B", 1).unwrap();
        assert_eq!(scan.shape, NodeShape::Rectangle);
        assert_eq!(scan.inner_raw, "Label");
        assert!(!scan.unclosed);
    }

    #[test]
    fn scans_stadium() {
        let scan = scan_shape("S([Start])", 1).unwrap();
        assert_eq!(scan.shape, NodeShape::Stadium);
        assert_eq!(scan.inner_raw, "Start");
    }

    #[test]
    fn detects_unclosed_bracket() {
        let scan = scan_shape("A[Label\nB --> C", 1).unwrap();
        assert!(scan.unclosed);
    }

    #[test]
    fn empty_content_detects_escaped_quote_typo() {
        assert!(is_empty_content("\"\\\""));
        assert!(is_empty_content("\" \""));
        assert!(is_empty_content(""));
        assert!(!is_empty_content("Dogs"));
    }

    #[test]
    fn detects_bracket_shape_mismatch() {
        let scan = scan_shape("A[Text)", 1).unwrap();
        assert_eq!(scan.shape, NodeShape::Rectangle);
        assert_eq!(scan.inner_raw, "Text");
        assert!(!scan.unclosed);
    }

    #[test]
    fn escaped_quote_typo_closes_without_swallowing_the_next_node() {
        let scan = scan_shape("A[\"\\\"] --> B[\" \"]", 1).unwrap();
        assert!(!scan.unclosed);
        assert_eq!(scan.inner_raw, "\"\\\"");
        assert!(is_empty_content(&scan.inner_raw));
    }

    #[test]
    fn embedded_escaped_quotes_still_protect_the_label() {
        let scan = scan_shape("A[\"Say \\\"hi\\\" there\"]", 1).unwrap();
        assert!(!scan.unclosed);
        assert_eq!(scan.inner_raw, "\"Say \\\"hi\\\" there\"");
    }
}
