//! Byte-offset <-> line/column conversion for the raw-text scanners (node
//! shapes, quote hygiene) that work directly against source text instead of
//! through the token cursor.

use diagramlint_core::Position;

pub fn position_at(source: &str, offset: usize) -> Position {
    let mut line: u32 = 1;
    let mut col: u32 = 1;
    for ch in source[..offset.min(source.len())].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_on_first_line() {
        assert_eq!(position_at("ABCD", 2), Position::new(1, 3));
    }

    #[test]
    fn offset_after_newline() {
        assert_eq!(position_at("AB\nCD", 3), Position::new(2, 1));
    }
}
