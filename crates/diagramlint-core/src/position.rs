use std::fmt;

/// A 1-based source position, with an optional code-point length used to
/// size a caret underline in the human report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub length: Option<u32>,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        assert!(line >= 1, "line is 1-based");
        assert!(column >= 1, "column is 1-based");
        Self { line, column, length: None }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        assert!(length >= 1, "length is at least 1 when set");
        self.length = Some(length);
        self
    }

    /// Shift this position's line by `offset`, keeping column/length fixed.
    pub fn offset_line(mut self, offset: i64) -> Self {
        let shifted = self.line as i64 + offset;
        self.line = shifted.max(1) as u32;
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Position::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn offset_line_never_goes_below_one() {
        assert_eq!(Position::new(2, 1).offset_line(-10).line, 1);
    }

    #[test]
    fn with_length_sets_optional_field() {
        let pos = Position::new(2, 3).with_length(4);
        assert_eq!(pos.length, Some(4));
    }
}
