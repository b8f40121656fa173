//! Flowchart family: lexing reuses the shared token vocabulary, parsing is
//! a resilient recursive descent with token-class recovery, building the
//! `diagramlint_core::model::Flowchart` domain model directly.

mod shape;

use diagramlint_core::model::flowchart::{ArrowType, Direction, Edge, EndMarker, Flowchart, Node, NodeShape};
use diagramlint_core::{Diagnostics, Edit, Fix, Position};

use crate::lexer::{tokenize, Token};
use crate::offsets::position_at;
use crate::parser_core::Cursor;

pub fn parse(source: &str) -> (Flowchart, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut cursor = Cursor::new(tokenize(source));
    let mut model = Flowchart::default();

    parse_header(source, &mut cursor, &mut diags, &mut model);
    cursor.skip_newlines();

    while !cursor.eof() {
        if cursor.at(Token::Ident("end")) {
            // Stray `end` outside any subgraph: skip it and move on.
            diags.error(cursor.current_position(), "unexpected 'end' outside a subgraph").emit();
            cursor.recover_to_newline();
        } else if cursor.at(Token::Ident("subgraph")) {
            parse_subgraph(source, &mut cursor, &mut diags, &mut model, None, 0);
        } else if is_opaque_keyword(&cursor.current_token()) {
            cursor.recover_to_newline();
        } else {
            parse_chain(source, &mut cursor, &mut diags, &mut model);
        }
        cursor.skip_newlines();
    }

    (model, diags)
}

fn is_opaque_keyword(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Ident("style") | Token::Ident("classDef") | Token::Ident("class") |
        Token::Ident("linkStyle") | Token::Ident("click")
    )
}

fn parse_header(source: &str, cursor: &mut Cursor<'_>, diags: &mut Diagnostics, model: &mut Flowchart) {
    cursor.skip_newlines();
    let Some(keyword) = cursor.bump() else { return };
    debug_assert!(matches!(keyword.token, Token::Ident("flowchart") | Token::Ident("graph")));

    match cursor.current() {
        Some(tok) if tok.token == Token::Newline => {
            let pos = Position::new(keyword.span.end_line, keyword.span.end_col);
            diags
                .error(pos, "flowchart is missing a direction")
                .code("FL-DIR-MISSING")
                .fix(Fix::new(" TD", "append a default direction"))
                .emit();
        }
        None => {
            let pos = Position::new(keyword.span.end_line, keyword.span.end_col);
            diags
                .error(pos, "flowchart is missing a direction")
                .code("FL-DIR-MISSING")
                .fix(Fix::new(" TD", "append a default direction"))
                .emit();
        }
        Some(tok) => {
            if let Token::Ident(word) = tok.token {
                if let Some(dir) = Direction::parse(word) {
                    model.direction = Some(dir);
                    cursor.bump();
                } else {
                    let pos = Position::new(tok.span.start_line, tok.span.start_col).with_length(word.len() as u32);
                    diags
                        .error(pos, format!("'{word}' is not a recognized direction"))
                        .code("FL-DIR-INVALID")
                        .hint("expected one of TB, TD, BT, LR, RL")
                        .emit();
                    cursor.bump();
                }
            } else {
                let pos = Position::new(keyword.span.end_line, keyword.span.end_col);
                diags
                    .error(pos, "flowchart is missing a direction")
                    .code("FL-DIR-MISSING")
                    .fix(Fix::new(" TD", "append a default direction"))
                    .emit();
            }
        }
    }

    cursor.recover_to_newline();
}

fn parse_subgraph(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    model: &mut Flowchart,
    parent: Option<String>,
    depth: u32,
) {
    let open_tok = cursor.bump().expect("checked by caller");
    let open_pos = Position::new(open_tok.span.start_line, open_tok.span.start_col);

    let (id, _label) = match cursor.current() {
        Some(tok) if tok.token != Token::Newline => {
            let (text, _) = cursor.rest_of_line_text();
            (text.clone(), Some(text))
        }
        _ => (format!("__subgraph{depth}_{}", model.subgraphs.len()), None),
    };

    model.subgraphs.entry(id.clone()).or_insert_with(|| diagramlint_core::model::flowchart::Subgraph {
        id: id.clone(),
        label: _label,
        members: Default::default(),
        parent: parent.clone(),
    });

    cursor.recover_to_newline();
    cursor.skip_newlines();

    loop {
        if cursor.eof() {
            break;
        }
        if cursor.at(Token::Ident("end")) {
            cursor.bump();
            break;
        }
        if cursor.at(Token::Ident("subgraph")) {
            parse_subgraph(source, cursor, diags, model, Some(id.clone()), depth + 1);
            cursor.skip_newlines();
            continue;
        }
        if cursor.at(Token::Ident("direction")) {
            cursor.bump();
            cursor.recover_to_newline();
            cursor.skip_newlines();
            continue;
        }
        if let Some(tok) = cursor.current() {
            if let Token::Ident(word) = tok.token {
                if word != "direction" {
                    if let Some(next) = cursor.nth(1) {
                        if let Token::Ident(next_word) = next.token {
                            if Direction::parse(next_word).is_some() {
                                let pos = Position::new(tok.span.start_line, tok.span.start_col)
                                    .with_length(word.len() as u32);
                                diags
                                    .error(pos, format!("'{word}' is not a valid keyword before a direction"))
                                    .code("FL-DIR-KW-INVALID")
                                    .fix(Fix::new(
                                        "direction",
                                        "replace with the `direction` keyword",
                                    ))
                                    .emit();
                                cursor.bump();
                                cursor.recover_to_newline();
                                cursor.skip_newlines();
                                continue;
                            }
                        }
                    }
                }
            }
        }
        if is_opaque_keyword(&cursor.current_token()) {
            cursor.recover_to_newline();
        } else {
            parse_chain_into_subgraph(source, cursor, diags, model, &id);
        }
        cursor.skip_newlines();
    }
    let _ = open_pos;
}

fn parse_chain_into_subgraph(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    model: &mut Flowchart,
    subgraph_id: &str,
) {
    let before = model.nodes.len();
    parse_chain(source, cursor, diags, model);
    // Every node newly touched by this statement belongs to this subgraph.
    let members: Vec<String> = model.nodes.keys().skip(before.min(model.nodes.len())).cloned().collect();
    if let Some(sub) = model.subgraphs.get_mut(subgraph_id) {
        for id in members {
            sub.members.insert(id);
        }
    }
}

fn parse_chain(source: &str, cursor: &mut Cursor<'_>, diags: &mut Diagnostics, model: &mut Flowchart) {
    let Some(mut current_id) = parse_node_ref(source, cursor, diags, model) else {
        diags.error(cursor.current_position(), "expected a node reference").emit();
        cursor.recover_to_newline();
        return;
    };

    loop {
        match cursor.current() {
            None => break,
            Some(tok) if tok.token == Token::Newline => break,
            Some(tok) if is_arrow_token(tok.token) => {
                let (arrow, start_marker, end_marker, label) = parse_link(source, cursor, diags);
                let Some(next_id) = parse_node_ref(source, cursor, diags, model) else {
                    diags.error(cursor.current_position(), "expected a node reference after a link").emit();
                    cursor.recover_to_newline();
                    break;
                };
                model.edges.push(Edge {
                    id: format!("e{}", model.edges.len()),
                    source: current_id.clone(),
                    target: next_id.clone(),
                    arrow,
                    start_marker,
                    end_marker,
                    label,
                    style: None,
                });
                current_id = next_id;
            }
            Some(tok) if matches!(tok.token, Token::Ident(_)) => {
                let gap_pos = cursor.prev_end_position();
                diags
                    .error(gap_pos, "two node forms appear on one line without a link between them")
                    .code("FL-LINK-MISSING")
                    .fix(Fix::new("  --> ", "insert a default link"))
                    .emit();
                let Some(next_id) = parse_node_ref(source, cursor, diags, model) else { break };
                model.edges.push(Edge {
                    id: format!("e{}", model.edges.len()),
                    source: current_id.clone(),
                    target: next_id.clone(),
                    arrow: ArrowType::Arrow,
                    start_marker: EndMarker::None,
                    end_marker: EndMarker::Arrow,
                    label: None,
                    style: None,
                });
                current_id = next_id;
            }
            _ => {
                cursor.recover_to_newline();
                break;
            }
        }
    }
}

fn is_arrow_token(token: Token<'_>) -> bool {
    matches!(
        token,
        Token::SolidArrow
            | Token::ThinArrow
            | Token::DottedArrow
            | Token::ThickArrow
            | Token::InvisibleLink
            | Token::OpenLink
            | Token::Association
    )
}

fn parse_link(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
) -> (ArrowType, EndMarker, EndMarker, Option<String>) {
    let tok = cursor.current().expect("checked by caller");

    if tok.token == Token::Association {
        // `-- label -->` inline-label form: read text up to the terminating
        // real arrow token.
        cursor.bump();
        let mut label_parts = Vec::new();
        loop {
            match cursor.current() {
                Some(t) if is_arrow_token(t.token) && t.token != Token::Association => {
                    let (arrow, marker) = classify_arrow(t.token);
                    cursor.bump();
                    let label = if label_parts.is_empty() { None } else { Some(label_parts.join(" ")) };
                    return (arrow, EndMarker::None, marker, label);
                }
                Some(t) if t.token == Token::Newline => break,
                Some(t) => {
                    label_parts.push(t.text.to_string());
                    cursor.bump();
                }
                None => break,
            }
        }
        return (ArrowType::Open, EndMarker::None, EndMarker::None, None);
    }

    if tok.token == Token::ThinArrow {
        let pos = Position::new(tok.span.start_line, tok.span.start_col).with_length(2);
        diags
            .error(pos, "`->` is not a valid flowchart link")
            .code("FL-ARROW-INVALID")
            .fix(Fix::new("-->", "use a solid arrow link"))
            .emit();
    }

    cursor.bump();
    let (arrow, marker) = classify_arrow(tok.token);

    // Optional trailing `|label|`.
    if cursor.at(Token::Pipe) {
        cursor.bump();
        let mut label_parts = Vec::new();
        while let Some(t) = cursor.current() {
            if t.token == Token::Pipe || t.token == Token::Newline {
                break;
            }
            label_parts.push(t.text.to_string());
            cursor.bump();
        }
        cursor.eat(Token::Pipe);
        let label = if label_parts.is_empty() { None } else { Some(label_parts.join(" ")) };
        return (arrow, EndMarker::None, marker, label);
    }

    let _ = source;
    (arrow, EndMarker::None, marker, None)
}

fn classify_arrow(token: Token<'_>) -> (ArrowType, EndMarker) {
    match token {
        Token::SolidArrow | Token::ThinArrow => (ArrowType::Arrow, EndMarker::Arrow),
        Token::DottedArrow => (ArrowType::Dotted, EndMarker::Arrow),
        Token::ThickArrow => (ArrowType::Thick, EndMarker::Arrow),
        Token::InvisibleLink => (ArrowType::Invisible, EndMarker::None),
        Token::OpenLink => (ArrowType::Open, EndMarker::None),
        _ => (ArrowType::Arrow, EndMarker::Arrow),
    }
}

fn parse_node_ref(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    model: &mut Flowchart,
) -> Option<String> {
    let tok = cursor.current()?;
    let Token::Ident(id_text) = tok.token else { return None };
    cursor.bump();

    let mut scan_offset = tok.span.end_offset as usize;
    let bytes = source.as_bytes();
    while scan_offset < bytes.len() && (bytes[scan_offset] == b' ' || bytes[scan_offset] == b'\t') {
        scan_offset += 1;
    }

    if let Some(scan) = shape::scan_shape(source, scan_offset) {
        cursor.seek_to_offset(scan.close_end_offset as u32);
        let empty = shape::is_empty_content(&scan.inner_raw);

        if empty {
            let pos = position_at(source, scan_offset)
                .with_length((scan.close_end_offset - scan_offset) as u32);
            diags
                .error(pos, "node shape has no content")
                .code("FL-NODE-EMPTY")
                .fix(Fix::new("", "remove the empty shape"))
                .emit();
            model.nodes.entry(id_text.to_string()).or_insert(Node {
                id: id_text.to_string(),
                label: id_text.to_string(),
                shape: scan.shape,
                style: None,
                link: None,
            });
        } else if scan.unclosed {
            let closer = expected_closer(scan.shape);
            let pos = position_at(source, scan.close_end_offset);
            diags
                .error(pos, "node shape is missing its closing bracket")
                .code("FL-NODE-UNCLOSED-BRACKET")
                .fix(Fix::new(closer, "insert the matching closer"))
                .emit();
            model.nodes.entry(id_text.to_string()).or_insert(Node {
                id: id_text.to_string(),
                label: clean_label(&scan.inner_raw),
                shape: scan.shape,
                style: None,
                link: None,
            });
        } else if scan.mismatched {
            let closer = expected_closer(scan.shape);
            let pos = position_at(source, scan.close_start_offset)
                .with_length((scan.close_end_offset - scan.close_start_offset) as u32);
            diags
                .error(pos, "node shape's closing bracket does not match its opener")
                .code("FL-NODE-UNCLOSED-BRACKET")
                .fix(Fix::new(closer, "rewrite the closer to match the opener"))
                .emit();
            model.nodes.entry(id_text.to_string()).or_insert(Node {
                id: id_text.to_string(),
                label: clean_label(&scan.inner_raw),
                shape: scan.shape,
                style: None,
                link: None,
            });
        } else {
            check_label_hygiene(&scan.inner_raw, position_at(source, scan.open_end_offset), diags);
            model.nodes.entry(id_text.to_string()).or_insert(Node {
                id: id_text.to_string(),
                label: clean_label(&scan.inner_raw),
                shape: scan.shape,
                style: None,
                link: None,
            });
        }
    } else {
        model.nodes.entry(id_text.to_string()).or_insert(Node {
            id: id_text.to_string(),
            label: id_text.to_string(),
            shape: NodeShape::Rectangle,
            style: None,
            link: None,
        });
    }

    Some(id_text.to_string())
}

/// Quote hygiene for a quoted node label, section 4.4/4.6. `raw` is the
/// untrimmed text between the shape's brackets; only fires when that text
/// is actually quoted (bare labels have nothing to check).
fn check_label_hygiene(raw: &str, pos: Position, diags: &mut Diagnostics) {
    let trimmed = raw.trim();
    if trimmed.len() < 2 {
        return;
    }
    let first = trimmed.chars().next().unwrap();
    let last = trimmed.chars().last().unwrap();
    let inner = &trimmed[1..trimmed.len() - 1];

    if first == '"' && last == '"' {
        if inner.contains("\\\"") {
            diags
                .warning(pos, "escaped quote inside a flowchart label")
                .code("FL-LABEL-ESCAPED-QUOTE")
                .hint("use &quot; instead of \\\"")
                .fix(Fix::new(inner.replace("\\\"", "&quot;"), "replace \\\" with &quot;"))
                .emit();
        } else if inner.contains('"') {
            diags
                .error(pos, "unescaped double quote inside a double-quoted flowchart label")
                .code("FL-LABEL-DOUBLE-IN-DOUBLE")
                .emit();
        }
    } else if first == '\'' && last == '\'' && inner.contains('"') {
        diags
            .error(pos, "double quote inside a single-quoted flowchart label")
            .code("FL-LABEL-DOUBLE-IN-SINGLE")
            .fix(Fix::new(inner.replace('"', "&quot;"), "replace unescaped \" with &quot;"))
            .emit();
    }
}

fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let first = trimmed.chars().next().unwrap();
        let last = trimmed.chars().last().unwrap();
        if (first == '"' && last == '"') || (first == '\'' && last == '\'') {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

fn expected_closer(shape: NodeShape) -> &'static str {
    match shape {
        NodeShape::Rectangle => "]",
        NodeShape::Round => ")",
        NodeShape::Stadium => "])",
        NodeShape::Cylinder => ")]",
        NodeShape::Circle => "))",
        NodeShape::Diamond => "}",
        NodeShape::Hexagon => "}}",
        NodeShape::Parallelogram => "/]",
        NodeShape::Trapezoid => "\\]",
        NodeShape::TrapezoidInverted => "/]",
        NodeShape::Subroutine => "]]",
        NodeShape::Double => "]]]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_direction_is_flagged_and_fixed() {
        let (model, diags) = parse("flowchart\nA --> B\n");
        assert!(model.direction.is_none());
        let codes: Vec<_> = diags.iter().filter_map(|d| d.code.clone()).collect();
        assert!(codes.contains(&"FL-DIR-MISSING".to_string()));
    }

    #[test]
    fn invalid_arrow_reports_code_and_fix() {
        let (model, diags) = parse("flowchart TD\nA -> B\n");
        assert_eq!(model.edges.len(), 1);
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("FL-ARROW-INVALID")).unwrap();
        assert_eq!(diag.position, Position::new(2, 3).with_length(2));
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "-->");
    }

    #[test]
    fn empty_node_shapes_all_reported() {
        let (model, diags) = parse("flowchart TD\n    A[\"\\\"] --> B[\" \"]\n    B --> C[]\n");
        let empties = diags.iter().filter(|d| d.code.as_deref() == Some("FL-NODE-EMPTY")).count();
        assert_eq!(empties, 3);
        assert!(model.nodes.contains_key("A"));
        assert!(model.nodes.contains_key("C"));
    }

    #[test]
    fn missing_link_between_two_nodes_is_flagged() {
        let (model, diags) = parse("flowchart TD\nA B\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("FL-LINK-MISSING")));
        assert_eq!(model.edges.len(), 1);
    }

    #[test]
    fn subgraph_members_are_recorded() {
        let (model, _diags) = parse("flowchart TD\nsubgraph one\nA --> B\nend\n");
        let sub = model.subgraphs.get("one").unwrap();
        assert!(sub.members.contains("A"));
        assert!(sub.members.contains("B"));
    }

    #[test]
    fn escaped_quote_in_label_is_a_warning() {
        let (_model, diags) = parse("flowchart TD\nA[\"Dog\\\"s\"] --> B\n");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("FL-LABEL-ESCAPED-QUOTE")).unwrap();
        assert_eq!(diag.severity, diagramlint_core::Severity::Warning);
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "Dog&quot;s");
    }

    #[test]
    fn double_quote_in_single_quoted_label_is_flagged() {
        let (_model, diags) = parse("flowchart TD\nA['He said \"hi\"'] --> B\n");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("FL-LABEL-DOUBLE-IN-SINGLE")).unwrap();
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "He said &quot;hi&quot;");
    }

    #[test]
    fn double_quote_in_double_quoted_label_is_never_fixed() {
        let (_model, diags) = parse("flowchart TD\nA[\"a\"b\"] --> C\n");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("FL-LABEL-DOUBLE-IN-DOUBLE")).unwrap();
        assert!(diag.fix.is_none());
    }
}
