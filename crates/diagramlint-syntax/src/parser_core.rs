//! Shared parsing plumbing used by every family's recursive-descent parser:
//! trivia buffering, a delimiter stack for "unclosed X" diagnostics, and a
//! fuel-based stuck guard (a `Cell<u32>` counter) that only runs in debug
//! builds, existing purely to catch a parser bug during development, not a
//! user-facing condition.

use diagramlint_core::Position;

use crate::lexer::{Lexed, Token};

#[derive(Debug, Clone, Copy)]
pub struct OpenDelimiter {
    pub label: &'static str,
    pub position: Position,
}

/// A cursor over a lexed token stream that understands trivia (comments,
/// whitespace, here represented only by `Comment`, since horizontal
/// whitespace is never emitted as a token) and exposes the small set of
/// navigation primitives every family parser needs.
pub struct Cursor<'src> {
    tokens: Vec<Lexed<'src>>,
    pos: usize,
    delimiters: Vec<OpenDelimiter>,
    #[cfg(debug_assertions)]
    fuel: std::cell::Cell<u32>,
}

impl<'src> Cursor<'src> {
    pub fn new(tokens: Vec<Lexed<'src>>) -> Self {
        Self {
            tokens,
            pos: 0,
            delimiters: Vec::new(),
            #[cfg(debug_assertions)]
            fuel: std::cell::Cell::new(256),
        }
    }

    fn is_trivia(tok: Token<'_>) -> bool {
        matches!(tok, Token::Comment(_))
    }

    /// Skips comment trivia (but never newlines, which are grammar-significant
    /// statement terminators in every family).
    pub fn skip_trivia(&mut self) {
        while self.pos < self.tokens.len() && Self::is_trivia(self.tokens[self.pos].token) {
            self.pos += 1;
        }
    }

    pub fn eof(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.tokens.len()
    }

    pub fn current(&mut self) -> Option<Lexed<'src>> {
        self.skip_trivia();
        self.tokens.get(self.pos).copied()
    }

    pub fn current_token(&mut self) -> Token<'src> {
        self.current().map(|t| t.token).unwrap_or(Token::Error)
    }

    pub fn nth(&mut self, n: usize) -> Option<Lexed<'src>> {
        self.skip_trivia();
        let mut idx = self.pos;
        let mut seen = 0;
        while idx < self.tokens.len() {
            if !Self::is_trivia(self.tokens[idx].token) {
                if seen == n {
                    return Some(self.tokens[idx]);
                }
                seen += 1;
            }
            idx += 1;
        }
        None
    }

    /// Current position, or the position just past the last real token when
    /// at end of input (used for "missing X" diagnostics at EOF).
    pub fn current_position(&mut self) -> Position {
        if let Some(tok) = self.current() {
            Position::new(tok.span.start_line, tok.span.start_col)
        } else {
            self.eof_position()
        }
    }

    pub fn eof_position(&self) -> Position {
        match self.tokens.last() {
            Some(t) => Position::new(t.span.end_line, t.span.end_col),
            None => Position::new(1, 1),
        }
    }

    pub fn prev_end_position(&self) -> Position {
        let mut idx = self.pos;
        while idx > 0 {
            idx -= 1;
            if !Self::is_trivia(self.tokens[idx].token) {
                return Position::new(self.tokens[idx].span.end_line, self.tokens[idx].span.end_col);
            }
        }
        Position::new(1, 1)
    }

    pub fn current_offset(&mut self) -> u32 {
        match self.current() {
            Some(tok) => tok.span.start_offset,
            None => self.tokens.last().map(|t| t.span.end_offset).unwrap_or(0),
        }
    }

    /// Advances past every token that starts before `offset`. Used after a
    /// shape or label is parsed directly from raw source text (see the
    /// flowchart node-shape scanner), to resynchronize the token cursor
    /// with however many tokens that raw slice actually consumed.
    pub fn seek_to_offset(&mut self, offset: u32) {
        while let Some(tok) = self.tokens.get(self.pos) {
            if tok.span.start_offset >= offset {
                break;
            }
            self.pos += 1;
        }
    }

    /// Consumes and returns the current real token, advancing past it.
    pub fn bump(&mut self) -> Option<Lexed<'src>> {
        self.skip_trivia();
        let tok = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(tok)
    }

    pub fn at(&mut self, token: Token<'src>) -> bool {
        self.current_token() == token
    }

    pub fn eat(&mut self, token: Token<'src>) -> Option<Lexed<'src>> {
        if self.at(token) {
            self.bump()
        } else {
            None
        }
    }

    /// Advances past tokens up to (but not including) the next newline,
    /// used to resynchronize after an unexpected token.
    pub fn recover_to_newline(&mut self) {
        while let Some(tok) = self.current() {
            if tok.token == Token::Newline {
                break;
            }
            self.pos += 1;
        }
    }

    pub fn skip_newlines(&mut self) {
        while self.at(Token::Newline) {
            self.bump();
        }
    }

    pub fn push_delimiter(&mut self, label: &'static str, position: Position) {
        self.delimiters.push(OpenDelimiter { label, position });
    }

    pub fn pop_delimiter(&mut self) -> Option<OpenDelimiter> {
        self.delimiters.pop()
    }

    pub fn open_delimiters(&self) -> &[OpenDelimiter] {
        &self.delimiters
    }

    /// Returns the raw source slice from the current position to (but not
    /// including) the next newline or EOF, trimmed of surrounding
    /// whitespace, and advances past every token that made up the slice.
    /// This is the family-agnostic stand-in for a dedicated free-text
    /// lexer mode (section 4.2's "catch-all free-text token"): rather than
    /// tokenizing label/message bodies character class by character class,
    /// the parser reaches past tokenization entirely once it knows it wants
    /// raw text.
    pub fn rest_of_line_text(&mut self) -> (String, Position) {
        let start_pos = self.current_position();
        let mut parts = Vec::new();
        while let Some(tok) = self.current() {
            if tok.token == Token::Newline {
                break;
            }
            parts.push(tok.text);
            self.pos += 1;
        }
        (parts.join(" ").trim().to_string(), start_pos)
    }

    #[cfg(debug_assertions)]
    pub fn consume_fuel(&self) -> bool {
        let remaining = self.fuel.get();
        if remaining == 0 {
            return false;
        }
        self.fuel.set(remaining - 1);
        true
    }

    #[cfg(not(debug_assertions))]
    pub fn consume_fuel(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn skip_trivia_jumps_over_comments() {
        let mut cursor = Cursor::new(tokenize("A %% note\nB"));
        assert!(matches!(cursor.current_token(), Token::Ident("A")));
        cursor.bump();
        assert!(matches!(cursor.current_token(), Token::Newline));
    }

    #[test]
    fn rest_of_line_text_stops_before_newline() {
        let mut cursor = Cursor::new(tokenize("Dogs : 10\nCats : 5"));
        let (text, _) = cursor.rest_of_line_text();
        assert_eq!(text, "Dogs : 10");
    }

    #[test]
    fn delimiter_stack_tracks_openers() {
        let mut cursor = Cursor::new(tokenize(""));
        cursor.push_delimiter("subgraph", Position::new(1, 1));
        assert_eq!(cursor.open_delimiters().len(), 1);
        let popped = cursor.pop_delimiter().unwrap();
        assert_eq!(popped.label, "subgraph");
    }
}
