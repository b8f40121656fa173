//! Class family. Inline member blocks (`class Foo { ... }`) use the same
//! open/last-line tracking as sequence's block stack, just keyed on `{`/`}`
//! instead of a block keyword/`end`.

use diagramlint_core::model::class::{ClassDiagram, RelationKind};
use diagramlint_core::model::flowchart::Direction;
use diagramlint_core::{Diagnostics, Fix, Position};

use crate::lexer::{tokenize, Token};
use crate::parser_core::Cursor;

struct OpenBrace {
    indent: String,
    last_inner_line: u32,
}

pub fn parse(source: &str) -> (ClassDiagram, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut model = ClassDiagram::default();
    let mut cursor = Cursor::new(tokenize(source));
    let mut open_braces: Vec<OpenBrace> = Vec::new();

    cursor.skip_newlines();
    cursor.bump(); // `classDiagram`, guaranteed by the router
    cursor.recover_to_newline();
    cursor.skip_newlines();

    while !cursor.eof() {
        let line_no = cursor.current_position().line;
        for b in open_braces.iter_mut() {
            b.last_inner_line = line_no;
        }

        if cursor.at(Token::Ident("direction")) {
            cursor.bump();
            if let Some(tok) = cursor.current() {
                if let Token::Ident(word) = tok.token {
                    if let Some(dir) = Direction::parse(word) {
                        model.direction = Some(dir);
                        cursor.bump();
                    }
                }
            }
            cursor.recover_to_newline();
        } else if cursor.at(Token::Ident("class")) {
            cursor.bump();
            parse_class_decl(source, &mut cursor, &mut model, &mut open_braces);
        } else if cursor.at(Token::RBrace) {
            cursor.bump();
            open_braces.pop();
        } else if looks_like_relation(&mut cursor) {
            parse_relation(&mut cursor, &mut diags, &mut model, line_no);
        } else if matches!(cursor.current_token(), Token::Ident(_)) {
            parse_member_line(&mut cursor, &mut model);
        } else {
            cursor.recover_to_newline();
        }
        cursor.skip_newlines();
    }

    while let Some(brace) = open_braces.pop() {
        let pos = Position::new(brace.last_inner_line + 1, 1);
        diags
            .error(pos, "class block is missing its closing '}'")
            .code("CL-BLOCK-MISSING-RBRACE")
            .fix(Fix::new(format!("{}}}\n", brace.indent), "insert the missing closing brace"))
            .emit();
    }

    (model, diags)
}

fn looks_like_relation(cursor: &mut Cursor<'_>) -> bool {
    if !matches!(cursor.current_token(), Token::Ident(_)) {
        return false;
    }
    for n in 1..=3 {
        if let Some(tok) = cursor.nth(n) {
            if is_relation_operator(tok.token) {
                return true;
            }
            if tok.token == Token::Newline {
                return false;
            }
        }
    }
    false
}

fn is_relation_operator(token: Token<'_>) -> bool {
    matches!(
        token,
        Token::Extends
            | Token::Composition
            | Token::Aggregation
            | Token::Realization
            | Token::Dependency
            | Token::Association
            | Token::ThinArrow
    )
}

fn parse_class_decl(
    source: &str,
    cursor: &mut Cursor<'_>,
    model: &mut ClassDiagram,
    open_braces: &mut Vec<OpenBrace>,
) {
    let Some(id_tok) = cursor.bump() else { return };
    let Token::Ident(id) = id_tok.token else { return };
    model.ensure_class(id);

    if let Some(stereotype) = parse_stereotype(cursor) {
        model.ensure_class(id).stereotype = Some(stereotype);
    }
    if cursor.at(Token::Ident("as")) {
        cursor.bump();
        if let Some(alias_tok) = cursor.current() {
            if let Token::Ident(alias) = alias_tok.token {
                model.ensure_class(id).display = alias.to_string();
                cursor.bump();
            }
        }
    }

    if cursor.at(Token::LBrace) {
        let line_no = cursor.current_position().line;
        cursor.bump();
        let pos = cursor.current_position();
        cursor.push_delimiter("class-block", pos);
        open_braces.push(OpenBrace { indent: line_indent(source, line_no), last_inner_line: line_no });
        cursor.skip_newlines();
        while !cursor.eof() && !cursor.at(Token::RBrace) {
            if let Some(brace) = open_braces.last_mut() {
                brace.last_inner_line = cursor.current_position().line;
            }
            parse_member_line(cursor, model);
            cursor.skip_newlines();
        }
        if cursor.at(Token::RBrace) {
            cursor.bump();
            cursor.pop_delimiter();
            open_braces.pop();
        }
    } else {
        cursor.recover_to_newline();
    }
}

/// Parses a `<<Name>>` stereotype marker at the cursor, if present. The
/// shared lexer has no multi-character `<<`/`>>` tokens (they would collide
/// with the relation operators), so this matches two adjacent `<` tokens by
/// hand, same as the arrow catalog's bidirectional tokens do it as a single
/// literal — here it has to be two, since state pseudo-state markers
/// (`<<choice>>`) reuse this exact shape.
fn parse_stereotype(cursor: &mut Cursor<'_>) -> Option<String> {
    if !(cursor.current_token() == Token::Lt && cursor.nth(1).map(|t| t.token) == Some(Token::Lt)) {
        return None;
    }
    cursor.bump();
    cursor.bump();
    let mut parts = Vec::new();
    while let Some(tok) = cursor.current() {
        if tok.token == Token::Gt || tok.token == Token::Newline {
            break;
        }
        parts.push(tok.text.to_string());
        cursor.bump();
    }
    cursor.eat(Token::Gt);
    cursor.eat(Token::Gt);
    Some(parts.join(""))
}

fn parse_member_line(cursor: &mut Cursor<'_>, model: &mut ClassDiagram) {
    let Some(owner_tok) = cursor.current() else { return };
    if let Token::Ident(owner) = owner_tok.token {
        // `Foo : member` form names the class before the colon.
        if let Some(next) = cursor.nth(1) {
            if next.token == Token::Colon {
                cursor.bump();
                cursor.bump();
                let (text, _) = cursor.rest_of_line_text();
                add_member(model.ensure_class(owner), &text);
                return;
            }
        }
    }
    let (text, _) = cursor.rest_of_line_text();
    if let Some(owner_tok) = Some(owner_tok) {
        if let Token::Ident(owner) = owner_tok.token {
            add_member(model.ensure_class(owner), text.trim_start_matches(owner).trim());
        }
    }
}

fn add_member(class: &mut diagramlint_core::model::class::Class, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if text.contains('(') {
        class.methods.push(text.to_string());
    } else {
        class.attributes.push(text.to_string());
    }
}

fn parse_relation(cursor: &mut Cursor<'_>, diags: &mut Diagnostics, model: &mut ClassDiagram, line_no: u32) {
    let Some(source_tok) = cursor.bump() else { return };
    let Token::Ident(source) = source_tok.token else { return };
    model.ensure_class(source);

    skip_cardinality(cursor);

    let Some(op_tok) = cursor.current() else { return };
    let op = op_tok.token;
    cursor.bump();

    if op == Token::ThinArrow {
        diags
            .error(Position::new(line_no, 1), "'->' is not a valid class relation operator")
            .code("CL-REL-INVALID")
            .emit();
    }

    skip_cardinality(cursor);

    let kind = relation_kind(op);
    let target = match cursor.current() {
        Some(tok) if matches!(tok.token, Token::Ident(_)) => {
            cursor.bump();
            if let Token::Ident(t) = tok.token {
                model.ensure_class(t);
                t.to_string()
            } else {
                unreachable!()
            }
        }
        _ => {
            diags
                .error(Position::new(line_no, 1), "relation is missing its target class")
                .code("CL-REL-MALFORMED")
                .emit();
            cursor.recover_to_newline();
            return;
        }
    };

    let label = if cursor.at(Token::Colon) {
        cursor.bump();
        let (text, _) = cursor.rest_of_line_text();
        Some(text)
    } else {
        cursor.recover_to_newline();
        None
    };

    model.relations.push(diagramlint_core::model::class::Relation {
        source: source.to_string(),
        target,
        kind,
        label,
        source_cardinality: None,
        target_cardinality: None,
    });
}

fn skip_cardinality(cursor: &mut Cursor<'_>) {
    if matches!(cursor.current_token(), Token::DoubleQuoted(_) | Token::SingleQuoted(_)) {
        cursor.bump();
    }
}

fn relation_kind(token: Token<'_>) -> RelationKind {
    match token {
        Token::Extends => RelationKind::Extends,
        Token::Composition => RelationKind::Composition,
        Token::Aggregation => RelationKind::Aggregation,
        Token::Realization => RelationKind::Realization,
        Token::Dependency => RelationKind::Dependency,
        _ => RelationKind::Association,
    }
}

fn line_indent(source: &str, line_no: u32) -> String {
    source
        .lines()
        .nth((line_no - 1) as usize)
        .map(|l| l.chars().take_while(|c| *c == ' ' || *c == '\t').collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_with_extends_is_recorded() {
        let (model, diags) = parse("classDiagram\nAnimal <|-- Dog\n");
        assert_eq!(model.relations.len(), 1);
        assert_eq!(model.relations[0].kind, RelationKind::Extends);
        assert!(diags.is_empty());
    }

    #[test]
    fn invalid_relation_operator_is_flagged() {
        let (_model, diags) = parse("classDiagram\nAnimal -> Dog\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("CL-REL-INVALID")));
    }

    #[test]
    fn unclosed_member_block_is_flagged() {
        let (model, diags) = parse("classDiagram\nclass Animal {\n  +String name\n");
        assert!(model.classes.contains_key("Animal"));
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("CL-BLOCK-MISSING-RBRACE")));
    }

    #[test]
    fn member_line_outside_block_adds_attribute() {
        let (model, _diags) = parse("classDiagram\nAnimal : +String name\n");
        assert_eq!(model.classes["Animal"].attributes, vec!["+String name".to_string()]);
    }
}
