//! Shared post-lex hygiene sweep, section 4.4: a single unclosed-quote
//! parity check run by every family over its own raw source text rather
//! than duplicated five times. Escaped-quote and double-in-double checks
//! stay local to each family's parser since they need the family's own
//! notion of "inside a label", but the global "is every quote closed"
//! count is family-agnostic.

use diagramlint_core::{Diagnostics, Position};

/// Scans `source` for unterminated quoted runs (tracking escapes) and, if
/// either quote character's parity across the whole file is odd, emits
/// `<prefix>-QUOTE-UNCLOSED` at the position of the first opener that was
/// never closed.
pub fn check_unclosed_quotes(source: &str, code_prefix: &str, diags: &mut Diagnostics) {
    if let Some(pos) = first_unclosed('"', source) {
        emit(diags, code_prefix, pos, '"');
    }
    if let Some(pos) = first_unclosed('\'', source) {
        emit(diags, code_prefix, pos, '\'');
    }
}

fn emit(diags: &mut Diagnostics, code_prefix: &str, pos: Position, quote: char) {
    diags
        .error(pos, format!("unclosed {quote} quote"))
        .code(format!("{code_prefix}-QUOTE-UNCLOSED"))
        .fix(diagramlint_core::Fix::new(quote.to_string(), "append a closing quote at end of line"))
        .emit();
}

/// Walks `source` tracking which quote char (if any) is currently open;
/// returns the position of an opener whose quote is still open when the
/// file ends (comparable to counting occurrences and checking parity, but
/// also pins down exactly which opener was never matched).
fn first_unclosed(quote: char, source: &str) -> Option<Position> {
    let mut line = 1u32;
    let mut col = 1u32;
    let mut open_at: Option<Position> = None;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            chars.next();
            col += 2;
            continue;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
            // A quote never spans a newline in this notation's labels; an
            // opener left dangling at end of line is itself unclosed.
            if open_at.is_some() {
                return open_at;
            }
            continue;
        }
        if ch == quote {
            match open_at {
                Some(_) => open_at = None,
                None => open_at = Some(Position::new(line, col)),
            }
        }
        col += 1;
    }

    open_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_quotes_report_nothing() {
        let mut diags = Diagnostics::new();
        check_unclosed_quotes("pie\n\"Dogs\" : 10\n", "PI", &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn dangling_opener_is_flagged_at_its_position() {
        let mut diags = Diagnostics::new();
        check_unclosed_quotes("pie\n\"Dogs : 10\n", "PI", &mut diags);
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("PI-QUOTE-UNCLOSED")).unwrap();
        assert_eq!(diag.position, Position::new(2, 1));
    }
}
