//! A single token vocabulary shared by every diagram family: one
//! `#[derive(Logos)]` enum, comments/whitespace skipped, arrows recognized
//! as their own
//! variants (logos performs maximal-munch automatically so `-->` always
//! beats `->` without needing family-specific ordering tricks). Keywords
//! are not separate token kinds — they are plain identifiers compared by
//! text in each parser, which is exactly the "longest match wins toward
//! identifier" rule in section 4.2 taken to its conclusion.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
pub enum Token<'src> {
    #[token("\n")]
    Newline,

    #[regex(r"%%[^\n]*", allow_greedy = true)]
    Comment(&'src str),

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted(&'src str),

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted(&'src str),

    #[regex(r#""([^"\\]|\\.)*"#, priority = 1)]
    UnterminatedDoubleQuoted(&'src str),

    #[regex(r"'([^'\\]|\\.)*", priority = 1)]
    UnterminatedSingleQuoted(&'src str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number(&'src str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'src str),

    #[token("<<-->>")]
    DoubleOpenBiArrow,
    #[token("<<->>")]
    OpenBiArrow,
    #[token("-->>")]
    SolidOpenArrow,
    #[token("->>")]
    ThinOpenArrow,
    #[token("--x")]
    SolidCrossArrow,
    #[token("-x")]
    ThinCrossArrow,
    #[token("--)")]
    SolidOpenCircleArrow,
    #[token("-)")]
    ThinOpenCircleArrow,
    #[token("-.->")]
    DottedArrow,
    #[token("==>")]
    ThickArrow,
    #[token("~~~")]
    InvisibleLink,
    #[token("-->")]
    SolidArrow,
    #[token("->")]
    ThinArrow,
    #[token("---")]
    OpenLink,
    #[token("<|--")]
    Extends,
    #[token("*--")]
    Composition,
    #[token("o--")]
    Aggregation,
    #[token("..|>")]
    Realization,
    #[token("..>")]
    Dependency,
    #[token("--")]
    Association,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("+")]
    Plus,
    #[token("#")]
    Hash,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("-")]
    Minus,
    #[token("=")]
    Equals,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("*")]
    Star,

    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_offset: u32,
    pub end_offset: u32,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexed<'src> {
    pub token: Token<'src>,
    pub text: &'src str,
    pub span: Span,
}

/// Runs the shared lexer over `source`, attaching 1-based line/column
/// positions to every token. Malformed atomic tokens (here: an unterminated
/// quoted string) are still emitted, as `Token::Unterminated*Quoted`, so the
/// caller can turn them into a `<FAMILY>-QUOTE-UNCLOSED` diagnostic while the
/// rest of the stream keeps flowing, per section 4.2's failure-mode rule.
pub fn tokenize(source: &str) -> Vec<Lexed<'_>> {
    let mut out = Vec::new();
    let mut line: u32 = 1;
    let mut col: u32 = 1;
    let mut prev_end_offset: u32 = 0;
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let token = result.unwrap_or(Token::Error);
        let start_offset = lexer.span().start as u32;
        let end_offset = lexer.span().end as u32;

        // Whitespace matched by `#[logos(skip)]` is never emitted as a token,
        // so the gap between the previous token's end and this one's start
        // has to be walked explicitly to keep columns accurate. The skip
        // pattern never matches a newline, so this only ever advances column.
        let gap = &source[prev_end_offset as usize..start_offset as usize];
        col += gap.chars().count() as u32;

        let start_line = line;
        let start_col = col;

        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }

        out.push(Lexed {
            token,
            text,
            span: Span { start_offset, end_offset, start_line, start_col, end_line: line, end_col: col },
        });
        prev_end_offset = end_offset;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token<'_>> {
        tokenize(src).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn maximal_munch_prefers_longer_arrow() {
        assert_eq!(kinds("-->"), vec![Token::SolidArrow]);
        assert_eq!(kinds("->"), vec![Token::ThinArrow]);
    }

    #[test]
    fn comments_and_whitespace_are_skipped_by_caller_via_kind() {
        let toks = tokenize("A  %% comment\nB");
        assert!(matches!(toks[0].token, Token::Ident("A")));
        assert!(matches!(toks[1].token, Token::Comment(_)));
        assert!(matches!(toks[2].token, Token::Newline));
        assert!(matches!(toks[3].token, Token::Ident("B")));
    }

    #[test]
    fn unterminated_double_quote_is_recoverable() {
        let toks = tokenize("\"Dogs");
        assert!(matches!(toks[0].token, Token::UnterminatedDoubleQuoted(_)));
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let toks = tokenize("A -> B\n");
        let arrow = toks.iter().find(|t| t.token == Token::ThinArrow).unwrap();
        assert_eq!(arrow.span.start_line, 1);
        assert_eq!(arrow.span.start_col, 3);
    }
}
