//! Pie family. The grammar is small enough that slice statements are parsed
//! directly against raw line text (mirroring the flowchart shape scanner's
//! approach) rather than through the shared token cursor, since a label's
//! content is unstructured free text up to an unquoted colon.

use diagramlint_core::model::pie::{Pie, Slice};
use diagramlint_core::{Diagnostics, Fix, Position};

use crate::lexer::{tokenize, Token};
use crate::offsets::position_at;
use crate::parser_core::Cursor;

pub fn parse(source: &str) -> (Pie, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut pie = Pie::default();
    let mut cursor = Cursor::new(tokenize(source));

    cursor.skip_newlines();
    cursor.bump(); // `pie` keyword, guaranteed present by the router
    if cursor.at(Token::Ident("showData")) {
        pie.show_data = true;
        cursor.bump();
    }
    cursor.recover_to_newline();
    cursor.skip_newlines();

    if cursor.at(Token::Ident("title")) {
        cursor.bump();
        let (text, _) = cursor.rest_of_line_text();
        pie.title = Some(text);
        cursor.skip_newlines();
    }

    while !cursor.eof() {
        let line_start_offset = cursor.current_offset() as usize;
        let line_end_offset =
            source[line_start_offset..].find('\n').map(|i| line_start_offset + i).unwrap_or(source.len());
        let line = &source[line_start_offset..line_end_offset];
        let line_no = position_at(source, line_start_offset).line;

        if !line.trim().is_empty() {
            parse_slice_line(line, line_no, line_start_offset, &mut diags, &mut pie);
        }

        cursor.seek_to_offset(line_end_offset as u32);
        cursor.skip_newlines();
    }

    (pie, diags)
}

fn parse_slice_line(line: &str, line_no: u32, line_start_offset: usize, diags: &mut Diagnostics, pie: &mut Pie) {
    let indent = line.len() - line.trim_start().len();
    let content = line.trim_end();

    let colon_idx = find_unquoted_colon(content);

    let Some(colon_idx) = colon_idx else {
        let pos = Position::new(line_no, (indent + 1) as u32);
        diags
            .error(pos, "pie slice is missing its ':' separator before the value")
            .code("PI-MISSING-COLON")
            .fix(Fix::new(" : ", "insert the slice separator"))
            .emit();
        return;
    };

    let label_raw = content[..colon_idx].trim();
    let value_raw = content[colon_idx + 1..].trim();

    let label = if label_raw.starts_with('"') && label_raw.ends_with('"') && label_raw.len() >= 2 {
        check_quoted_label_hygiene(label_raw, line_no, indent, diags);
        label_raw[1..label_raw.len() - 1].to_string()
    } else {
        let pos = Position::new(line_no, (indent + 1) as u32);
        diags
            .error(pos, "pie slice label must be double-quoted")
            .code("PI-LABEL-REQUIRES-QUOTES")
            .fix(Fix::new(format!("\"{label_raw}\""), "wrap the label in double quotes"))
            .emit();
        label_raw.to_string()
    };

    let value: f64 = value_raw.parse().unwrap_or(0.0);
    pie.slices.push(Slice { label, value, color: None });
    let _ = line_start_offset;
}

fn find_unquoted_colon(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut in_double = false;
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if ch == '\\' {
            i += 2;
            continue;
        }
        if ch == '"' {
            in_double = !in_double;
        } else if ch == ':' && !in_double {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn check_quoted_label_hygiene(label_raw: &str, line_no: u32, indent: usize, diags: &mut Diagnostics) {
    let inner = &label_raw[1..label_raw.len() - 1];
    if inner.contains("\\\"") {
        let pos = Position::new(line_no, (indent + 1) as u32);
        diags
            .error(pos, "escaped quote inside a pie label")
            .code("PI-LABEL-ESCAPED-QUOTE")
            .hint("use &quot; instead of \\\"")
            .fix(Fix::new(inner.replace("\\\"", "&quot;"), "replace \\\" with &quot;"))
            .emit();
        return;
    }
    // An inner unescaped `"` would have already terminated the DoubleQuoted
    // token lexically, surfacing as extra trailing content outside the
    // quotes; detect that by checking whether closing the first quote left
    // a stray quote further along the raw label.
    let mut depth = 0;
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] as char == '"' {
            depth += 1;
        }
        i += 1;
    }
    if depth > 0 {
        let pos = Position::new(line_no, (indent + 1) as u32);
        diags
            .error(pos, "unescaped double quote inside a double-quoted pie label")
            .code("PI-LABEL-DOUBLE-IN-DOUBLE")
            .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_label_requires_quotes() {
        let (pie, diags) = parse("pie\nDogs : 10\n");
        assert_eq!(pie.slices.len(), 1);
        assert_eq!(pie.slices[0].label, "Dogs");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("PI-LABEL-REQUIRES-QUOTES")).unwrap();
        assert_eq!(diag.position, Position::new(2, 1));
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "\"Dogs\"");
    }

    #[test]
    fn quoted_label_with_colon_parses_cleanly() {
        let (pie, diags) = parse("pie showData\ntitle Pets\n\"Dogs\" : 10\n\"Cats\" : 5\n");
        assert!(pie.show_data);
        assert_eq!(pie.title.as_deref(), Some("Pets"));
        assert_eq!(pie.slices.len(), 2);
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_colon_is_reported() {
        let (_pie, diags) = parse("pie\n\"Dogs\" 10\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("PI-MISSING-COLON")));
    }

    #[test]
    fn escaped_quote_in_label_is_flagged() {
        let (_pie, diags) = parse("pie\n\"Dog\\\"s\" : 10\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("PI-LABEL-ESCAPED-QUOTE")));
    }
}
