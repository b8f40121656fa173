//! State family. Pseudo-states (`[*]`) are synthesized into ordinary nodes
//! via `synthetic_pseudo_id` so the rest of the model never has to special
//! case them; composite blocks reuse the same open-brace-stack pattern as
//! the class family's member blocks, just with `--` dividing lanes instead
//! of terminating the block.

use diagramlint_core::model::flowchart::Direction;
use diagramlint_core::model::state::{
    synthetic_pseudo_id, Composite, Lane, StateDiagram, StateNode, StateNodeKind, Transition,
};
use diagramlint_core::{Diagnostics, Fix, Position};

use crate::lexer::{tokenize, Token};
use crate::parser_core::Cursor;

struct OpenComposite {
    id: String,
    indent: String,
    last_inner_line: u32,
    lane_count: usize,
}

pub fn parse(source: &str) -> (StateDiagram, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut model = StateDiagram::default();
    let mut cursor = Cursor::new(tokenize(source));
    let mut open: Vec<OpenComposite> = Vec::new();
    let mut start_occurrences = 0usize;
    let mut end_occurrences = 0usize;

    cursor.skip_newlines();
    cursor.bump(); // `stateDiagram` or `stateDiagram-v2`, guaranteed by the router
    cursor.recover_to_newline();
    cursor.skip_newlines();

    while !cursor.eof() {
        let line_no = cursor.current_position().line;
        if let Some(top) = open.last_mut() {
            top.last_inner_line = line_no;
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
        } else if cursor.at(Token::Ident("state")) {
            cursor.bump();
            parse_state_decl(source, &mut cursor, &mut diags, &mut model, &mut open);
        } else if cursor.at(Token::RBrace) {
            cursor.bump();
            open.pop();
        } else if cursor.at(Token::Association) && !open.is_empty() {
            // `--` inside a composite starts a new lane.
            cursor.bump();
            cursor.recover_to_newline();
            if let Some(top) = open.last_mut() {
                top.lane_count += 1;
                let lane_id = format!("lane{}", top.lane_count);
                model.lanes.push(Lane { parent: top.id.clone(), lane_id, members: Default::default() });
            }
        } else if cursor.at(Token::LBracket) || matches!(cursor.current_token(), Token::Ident(_)) {
            parse_transition_or_description(
                &mut cursor,
                &mut diags,
                &mut model,
                &mut open,
                &mut start_occurrences,
                &mut end_occurrences,
                line_no,
            );
        } else {
            cursor.recover_to_newline();
        }
        cursor.skip_newlines();
    }

    while let Some(composite) = open.pop() {
        let pos = Position::new(composite.last_inner_line + 1, 1);
        diags
            .error(pos, "state composite block is missing its closing '}'")
            .code("ST-BLOCK-MISSING-RBRACE")
            .fix(Fix::new(format!("{}}}\n", composite.indent), "insert the missing closing brace"))
            .emit();
    }

    (model, diags)
}

fn ensure_node<'a>(model: &'a mut StateDiagram, id: &str, kind: StateNodeKind, parent: Option<String>) -> &'a mut StateNode {
    model.nodes.entry(id.to_string()).or_insert_with(|| StateNode {
        id: id.to_string(),
        label: None,
        kind,
        parent,
    })
}

fn register_member(model: &mut StateDiagram, open: &[OpenComposite], id: &str) {
    if let Some(top) = open.last() {
        if let Some(composite) = model.composites.get_mut(&top.id) {
            composite.members.insert(id.to_string());
        }
        if top.lane_count > 0 {
            if let Some(lane) = model.lanes.last_mut() {
                lane.members.insert(id.to_string());
            }
        }
    }
}

/// Parses a single endpoint of a transition: `[*]`, a bare identifier
/// (possibly a history marker `H`/`H*`), returning its resolved id.
fn parse_endpoint(
    cursor: &mut Cursor<'_>,
    model: &mut StateDiagram,
    open: &[OpenComposite],
    start_occurrences: &mut usize,
    end_occurrences: &mut usize,
    is_source: bool,
) -> Option<String> {
    if cursor.at(Token::LBracket) {
        cursor.bump();
        cursor.eat(Token::Star);
        cursor.eat(Token::RBracket);
        let (kind, occurrence) = if is_source {
            *start_occurrences += 1;
            (StateNodeKind::Start, *start_occurrences - 1)
        } else {
            *end_occurrences += 1;
            (StateNodeKind::End, *end_occurrences - 1)
        };
        let id = synthetic_pseudo_id(kind, occurrence);
        let parent = open.last().map(|o| o.id.clone());
        ensure_node(model, &id, kind, parent);
        register_member(model, open, &id);
        return Some(id);
    }

    let tok = cursor.current()?;
    let Token::Ident(name) = tok.token else { return None };
    cursor.bump();

    let deep = cursor.at(Token::Star) && name == "H";
    if deep {
        cursor.bump();
    }

    let kind = match name {
        "H" if deep => StateNodeKind::HistoryDeep,
        "H" => StateNodeKind::History,
        _ => StateNodeKind::Simple,
    };
    let parent = open.last().map(|o| o.id.clone());
    ensure_node(model, name, kind, parent);
    register_member(model, open, name);
    Some(name.to_string())
}

fn parse_transition_or_description(
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    model: &mut StateDiagram,
    open: &mut Vec<OpenComposite>,
    start_occurrences: &mut usize,
    end_occurrences: &mut usize,
    line_no: u32,
) {
    let Some(source_id) =
        parse_endpoint(cursor, model, open, start_occurrences, end_occurrences, true)
    else {
        cursor.recover_to_newline();
        return;
    };

    if let Some(stereotype) = parse_stereotype(cursor) {
        if let Some(node) = model.nodes.get_mut(&source_id) {
            node.kind = match stereotype.as_str() {
                "choice" => StateNodeKind::Choice,
                "fork" => StateNodeKind::Fork,
                "join" => StateNodeKind::Join,
                _ => node.kind,
            };
        }
        cursor.recover_to_newline();
        return;
    }

    if cursor.at(Token::Colon) {
        cursor.bump();
        let (text, _) = cursor.rest_of_line_text();
        if let Some(node) = model.nodes.get_mut(&source_id) {
            node.label = Some(text);
        }
        return;
    }

    if cursor.at(Token::SolidArrow) {
        cursor.bump();
        let Some(target_id) =
            parse_endpoint(cursor, model, open, start_occurrences, end_occurrences, false)
        else {
            diags
                .error(Position::new(line_no, 1), "transition is missing its target state")
                .code("ST-TRANSITION-MALFORMED")
                .emit();
            cursor.recover_to_newline();
            return;
        };
        let label = if cursor.at(Token::Colon) {
            cursor.bump();
            let (text, _) = cursor.rest_of_line_text();
            Some(text)
        } else {
            cursor.recover_to_newline();
            None
        };
        model.transitions.push(Transition { source: source_id, target: target_id, label });
        return;
    }

    cursor.recover_to_newline();
}

fn parse_state_decl(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    model: &mut StateDiagram,
    open: &mut Vec<OpenComposite>,
) {
    let label = if matches!(cursor.current_token(), Token::DoubleQuoted(_)) {
        let tok = cursor.bump().unwrap();
        let Token::DoubleQuoted(q) = tok.token else { unreachable!() };
        Some(q.trim_matches('"').to_string())
    } else {
        None
    };

    if label.is_some() && cursor.at(Token::Ident("as")) {
        cursor.bump();
    }

    let Some(id_tok) = cursor.bump() else { return };
    let Token::Ident(id) = id_tok.token else { return };
    let parent = open.last().map(|o| o.id.clone());
    {
        let node = ensure_node(model, id, StateNodeKind::Simple, parent.clone());
        if label.is_some() {
            node.label = label.clone();
        }
    }
    register_member(model, open, id);

    if let Some(stereotype) = parse_stereotype(cursor) {
        if let Some(node) = model.nodes.get_mut(id) {
            node.kind = match stereotype.as_str() {
                "choice" => StateNodeKind::Choice,
                "fork" => StateNodeKind::Fork,
                "join" => StateNodeKind::Join,
                _ => node.kind,
            };
        }
    }

    if cursor.at(Token::LBrace) {
        let line_no = cursor.current_position().line;
        cursor.bump();
        let pos = cursor.current_position();
        cursor.push_delimiter("state-block", pos);
        model.composites.entry(id.to_string()).or_insert_with(|| Composite {
            id: id.to_string(),
            label: label.clone(),
            members: Default::default(),
            parent,
        });
        if let Some(node) = model.nodes.get_mut(id) {
            node.kind = StateNodeKind::Composite;
        }
        open.push(OpenComposite { id: id.to_string(), indent: line_indent(source, line_no), last_inner_line: line_no, lane_count: 0 });
    } else {
        cursor.recover_to_newline();
    }
    let _ = diags;
}

/// Parses a `<<choice|fork|join>>` pseudo-state marker, if present.
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
    fn start_and_end_pseudo_states_are_synthesized() {
        let (model, diags) = parse("stateDiagram-v2\n[*] --> Idle\nIdle --> [*]\n");
        assert!(diags.is_empty());
        assert_eq!(model.transitions.len(), 2);
        assert!(model.nodes.values().any(|n| n.kind == StateNodeKind::Start));
        assert!(model.nodes.values().any(|n| n.kind == StateNodeKind::End));
        assert!(model.nodes.contains_key("Idle"));
    }

    #[test]
    fn composite_block_groups_members() {
        let (model, diags) =
            parse("stateDiagram-v2\nstate Active {\n  [*] --> Running\n  Running --> Paused\n}\n");
        assert!(diags.is_empty());
        assert_eq!(model.nodes["Active"].kind, StateNodeKind::Composite);
        assert!(model.composites["Active"].members.contains("Running"));
        assert!(model.composites["Active"].members.contains("Paused"));
    }

    #[test]
    fn unclosed_composite_block_is_flagged() {
        let (model, diags) = parse("stateDiagram-v2\nstate Active {\n  [*] --> Running\n");
        assert!(model.composites.contains_key("Active"));
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("ST-BLOCK-MISSING-RBRACE")));
    }

    #[test]
    fn state_description_sets_label() {
        let (model, diags) = parse("stateDiagram-v2\nIdle : waiting for input\n");
        assert!(diags.is_empty());
        assert_eq!(model.nodes["Idle"].label.as_deref(), Some("waiting for input"));
    }

    #[test]
    fn choice_marker_sets_pseudo_state_kind() {
        let (model, diags) = parse("stateDiagram-v2\nstate Check <<choice>>\nCheck --> Idle\n");
        assert!(diags.is_empty());
        assert_eq!(model.nodes["Check"].kind, StateNodeKind::Choice);
    }

    #[test]
    fn deep_history_marker_is_recognized() {
        let (model, diags) = parse("stateDiagram-v2\nstate Active {\n  [*] --> H*\n}\n");
        assert!(diags.is_empty());
        assert_eq!(model.nodes["H"].kind, StateNodeKind::HistoryDeep);
    }
}
