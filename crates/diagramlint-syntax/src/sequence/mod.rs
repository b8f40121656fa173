//! Sequence family. Statements are newline-terminated; blocks are tracked
//! with a flat open-block stack (mirroring `Cursor`'s delimiter stack) since
//! the event stream itself is flat (`BlockStart`/`BlockEnd` pairs), so no
//! tree-shaped block representation is needed to preserve nesting.

use diagramlint_core::model::sequence::{
    Autonumber, Branch, BranchTag, BlockKind, Event, LineStyle, Message, MessageMarker, Note, NoteAnchor,
    Participant, Sequence,
};
use diagramlint_core::{Diagnostics, Fix, Position};

use crate::lexer::{tokenize, Token};
use crate::parser_core::Cursor;

struct OpenBlock {
    kind: BlockKind,
    indent: String,
    opener_line: u32,
    last_inner_line: u32,
}

pub fn parse(source: &str) -> (Sequence, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut seq = Sequence::default();
    let mut cursor = Cursor::new(tokenize(source));
    let mut activations: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    let mut blocks: Vec<OpenBlock> = Vec::new();
    let mut last_create: Option<String> = None;

    cursor.skip_newlines();
    cursor.bump(); // `sequenceDiagram`, guaranteed by the router
    cursor.recover_to_newline();
    cursor.skip_newlines();

    while !cursor.eof() {
        let line_no = cursor.current_position().line;
        for b in blocks.iter_mut() {
            b.last_inner_line = line_no;
        }

        match cursor.current_token() {
            Token::Ident("participant") | Token::Ident("actor") => {
                cursor.bump();
                parse_participant_decl(&mut cursor, &mut seq);
            }
            Token::Ident("autonumber") => {
                cursor.bump();
                parse_autonumber(source, &mut cursor, &mut diags, &mut seq, line_no);
            }
            Token::Ident("activate") => {
                cursor.bump();
                let (target, _) = cursor.rest_of_line_text();
                ensure_participant(&mut seq, &target);
                activate(&target, &mut activations, &mut diags, line_no, &mut seq);
            }
            Token::Ident("deactivate") => {
                cursor.bump();
                let (target, _) = cursor.rest_of_line_text();
                ensure_participant(&mut seq, &target);
                deactivate(&target, &mut activations, &mut diags, line_no, &mut seq);
            }
            Token::Ident("create") => {
                cursor.bump();
                let (target, _) = cursor.rest_of_line_text();
                ensure_participant(&mut seq, &target);
                if !next_message_involves(&mut cursor, &target) {
                    diags
                        .error(Position::new(line_no, 1), format!("'create {target}' is not followed by a message involving it"))
                        .code("SE-CREATE-NO-CREATING-MESSAGE")
                        .emit();
                }
                seq.events.push(Event::Create(target.clone()));
                last_create = Some(target);
            }
            Token::Ident("destroy") => {
                cursor.bump();
                let (target, _) = cursor.rest_of_line_text();
                ensure_participant(&mut seq, &target);
                seq.events.push(Event::Destroy(target));
            }
            Token::Ident("note") => {
                cursor.bump();
                parse_note(&mut cursor, &mut diags, &mut seq, line_no);
            }
            Token::Ident(word @ ("title" | "accTitle" | "accDescr" | "properties" | "details")) => {
                let pos = cursor.current_position();
                cursor.recover_to_newline();
                diags
                    .error(pos, format!("'{word}' is not supported"))
                    .code(format!("SE-{}-UNSUPPORTED", word.to_uppercase()))
                    .emit();
            }
            Token::Ident(word) if block_kind(word).is_some() => {
                let kind = block_kind(word).unwrap();
                let indent = line_indent(source, line_no);
                cursor.bump();
                let (title, _) = cursor.rest_of_line_text();
                let title = if title.is_empty() { None } else { Some(title) };
                seq.events.push(Event::BlockStart { kind, title });
                let pos = cursor.current_position();
                cursor.push_delimiter("block", pos);
                blocks.push(OpenBlock { kind, indent, opener_line: line_no, last_inner_line: line_no });
            }
            Token::Ident("else") => {
                let pos = cursor.current_position();
                cursor.bump();
                let (title, _) = cursor.rest_of_line_text();
                handle_branch(BranchTag::Else, title, pos, &mut blocks, &mut diags, &mut seq);
            }
            Token::Ident("and") => {
                let pos = cursor.current_position();
                cursor.bump();
                let (title, _) = cursor.rest_of_line_text();
                handle_branch(BranchTag::And, title, pos, &mut blocks, &mut diags, &mut seq);
            }
            Token::Ident("option") => {
                let pos = cursor.current_position();
                cursor.bump();
                let (title, _) = cursor.rest_of_line_text();
                handle_branch(BranchTag::Option, title, pos, &mut blocks, &mut diags, &mut seq);
            }
            Token::Ident("end") => {
                cursor.bump();
                cursor.pop_delimiter();
                if blocks.pop().is_some() {
                    seq.events.push(Event::BlockEnd);
                }
            }
            Token::Ident(_) => {
                parse_message(source, &mut cursor, &mut diags, &mut seq, line_no, &mut activations, &mut last_create);
            }
            _ => {
                cursor.recover_to_newline();
            }
        }
        cursor.skip_newlines();
    }

    for leftover in activations.values() {
        if *leftover > 0 {
            let pos = Position::new(cursor.eof_position().line, 1);
            diags
                .error(pos, "activation left open at end of diagram")
                .code("SE-ACTIVATION-UNBALANCED")
                .emit();
            break;
        }
    }

    while let Some(block) = blocks.pop() {
        let insert_line = block.last_inner_line + 1;
        let pos = Position::new(insert_line, 1);
        diags
            .error(pos, "block is missing its matching 'end'")
            .code("SE-BLOCK-MISSING-END")
            .fix(Fix::new(format!("{}end\n", block.indent), "insert the missing end line"))
            .emit();
        seq.events.push(Event::BlockEnd);
        let _ = block.opener_line;
    }

    (seq, diags)
}

fn next_message_involves(cursor: &mut Cursor<'_>, target: &str) -> bool {
    for n in [1, 3, 4] {
        if let Some(tok) = cursor.nth(n) {
            if tok.token == Token::Ident(target) {
                return true;
            }
        }
    }
    false
}

fn ensure_participant(seq: &mut Sequence, id: &str) {
    seq.participants.entry(id.to_string()).or_insert_with(|| Participant { id: id.to_string(), display: id.to_string() });
}

fn parse_participant_decl(cursor: &mut Cursor<'_>, seq: &mut Sequence) {
    let Some(id_tok) = cursor.bump() else { return };
    let Token::Ident(id) = id_tok.token else { return };
    let mut display = id.to_string();
    if cursor.at(Token::Ident("as")) {
        cursor.bump();
        let (text, _) = cursor.rest_of_line_text();
        display = text;
    } else {
        cursor.recover_to_newline();
    }
    seq.participants.entry(id.to_string()).or_insert(Participant { id: id.to_string(), display });
}

fn parse_autonumber(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    seq: &mut Sequence,
    line_no: u32,
) {
    if cursor.at(Token::Ident("off")) {
        cursor.bump();
        seq.autonumber.on = false;
        cursor.recover_to_newline();
        return;
    }

    seq.autonumber.on = true;
    seq.autonumber.start = 1;
    seq.autonumber.step = 1;

    let mut numbers = Vec::new();
    let mut saw_non_numeric = false;
    loop {
        match cursor.current_token() {
            Token::Number(n) => {
                numbers.push(n.parse::<i64>().unwrap_or(1));
                cursor.bump();
            }
            Token::Newline | Token::Error => break,
            _ if cursor.eof() => break,
            _ => {
                saw_non_numeric = true;
                cursor.bump();
            }
        }
    }

    if let Some(&start) = numbers.first() {
        seq.autonumber.start = start;
    }
    if let Some(&step) = numbers.get(1) {
        seq.autonumber.step = step;
    }

    if saw_non_numeric {
        let pos = Position::new(line_no, 1);
        if numbers.is_empty() {
            diags
                .error(pos, "autonumber argument is not numeric")
                .code("SE-AUTONUMBER-MALFORMED")
                .fix(Fix::new("", "remove the non-numeric arguments"))
                .emit();
        } else {
            diags
                .error(pos, "autonumber has extraneous trailing content")
                .code("SE-AUTONUMBER-EXTRANEOUS")
                .emit();
        }
    }
    let _ = source;
}

fn activate(
    target: &str,
    activations: &mut std::collections::HashMap<String, u32>,
    diags: &mut Diagnostics,
    line_no: u32,
    seq: &mut Sequence,
) {
    let count = activations.entry(target.to_string()).or_insert(0);
    if *count > 0 {
        diags
            .error(Position::new(line_no, 1), format!("'{target}' is already active"))
            .code("SE-ACTIVATION-ALREADY-ACTIVE")
            .emit();
    }
    *count += 1;
    seq.events.push(Event::Activate(target.to_string()));
}

fn deactivate(
    target: &str,
    activations: &mut std::collections::HashMap<String, u32>,
    diags: &mut Diagnostics,
    line_no: u32,
    seq: &mut Sequence,
) {
    let count = activations.entry(target.to_string()).or_insert(0);
    if *count == 0 {
        diags
            .error(Position::new(line_no, 1), format!("'{target}' has no matching activation"))
            .code("SE-DEACTIVATE-NO-ACTIVE")
            .emit();
    } else {
        *count -= 1;
    }
    seq.events.push(Event::Deactivate(target.to_string()));
}

fn parse_note(cursor: &mut Cursor<'_>, diags: &mut Diagnostics, seq: &mut Sequence, line_no: u32) {
    let anchor = if cursor.at(Token::Ident("left")) {
        cursor.bump();
        cursor.eat(Token::Ident("of"));
        NoteAnchor::LeftOf
    } else if cursor.at(Token::Ident("right")) {
        cursor.bump();
        cursor.eat(Token::Ident("of"));
        NoteAnchor::RightOf
    } else if cursor.at(Token::Ident("over")) {
        cursor.bump();
        NoteAnchor::Over
    } else {
        NoteAnchor::Over
    };

    let mut targets = Vec::new();
    loop {
        match cursor.current_token() {
            Token::Ident(id) => {
                targets.push(id.to_string());
                for id in &targets {
                    ensure_participant(seq, id);
                }
                cursor.bump();
                if cursor.at(Token::Comma) {
                    cursor.bump();
                    continue;
                }
                break;
            }
            _ => break,
        }
    }

    if cursor.at(Token::Colon) {
        cursor.bump();
        let (text, _) = cursor.rest_of_line_text();
        check_label_hygiene(&text, Position::new(line_no, 1), diags);
        seq.events.push(Event::Note(Note { anchor, targets, text }));
    } else {
        let (text, _) = cursor.rest_of_line_text();
        diags
            .error(Position::new(line_no, 1), "note is missing its ':' body")
            .code("SE-NOTE-MALFORMED")
            .fix(Fix::new(" : ", "insert the ':' separator"))
            .emit();
        seq.events.push(Event::Note(Note { anchor, targets, text }));
    }
}

fn block_kind(word: &str) -> Option<BlockKind> {
    match word {
        "alt" => Some(BlockKind::Alt),
        "opt" => Some(BlockKind::Opt),
        "loop" => Some(BlockKind::Loop),
        "par" => Some(BlockKind::Par),
        "critical" => Some(BlockKind::Critical),
        "break" => Some(BlockKind::Break),
        "rect" => Some(BlockKind::Rect),
        "box" => Some(BlockKind::Box),
        _ => None,
    }
}

fn handle_branch(
    tag: BranchTag,
    title: String,
    pos: Position,
    blocks: &mut [OpenBlock],
    diags: &mut Diagnostics,
    seq: &mut Sequence,
) {
    let title = if title.is_empty() { None } else { Some(title) };
    let Some(top) = blocks.last() else {
        emit_branch_outside(tag, pos, diags);
        return;
    };

    match (tag, top.kind) {
        (BranchTag::Else, BlockKind::Alt) => {
            seq.events.push(Event::BlockBranch(Branch { tag, title }));
        }
        (BranchTag::Else, BlockKind::Critical) => {
            diags
                .error(pos, "'else' is not valid inside 'critical'; use 'option'")
                .code("SE-ELSE-IN-CRITICAL")
                .fix(Fix::new("option", "rewrite 'else' to 'option'"))
                .emit();
            seq.events.push(Event::BlockBranch(Branch { tag: BranchTag::Option, title }));
        }
        (BranchTag::And, BlockKind::Par) => {
            seq.events.push(Event::BlockBranch(Branch { tag, title }));
        }
        (BranchTag::Option, BlockKind::Critical) => {
            seq.events.push(Event::BlockBranch(Branch { tag, title }));
        }
        _ => emit_branch_outside(tag, pos, diags),
    }
}

fn emit_branch_outside(tag: BranchTag, pos: Position, diags: &mut Diagnostics) {
    match tag {
        BranchTag::Else => {
            diags.error(pos, "'else' outside 'alt'").code("SE-ELSE-OUTSIDE-ALT").emit();
        }
        BranchTag::And => {
            diags.error(pos, "'and' outside 'par'").code("SE-AND-OUTSIDE-PAR").emit();
        }
        BranchTag::Option => {
            diags.error(pos, "'option' outside 'critical'").emit();
        }
    }
}

fn parse_message(
    source: &str,
    cursor: &mut Cursor<'_>,
    diags: &mut Diagnostics,
    seq: &mut Sequence,
    line_no: u32,
    activations: &mut std::collections::HashMap<String, u32>,
    last_create: &mut Option<String>,
) {
    let Some(from_tok) = cursor.bump() else { return };
    let Token::Ident(from) = from_tok.token else {
        cursor.recover_to_newline();
        return;
    };
    ensure_participant(seq, from);

    let Some((line_style, start_marker, end_marker, is_async)) = classify_arrow(cursor.current_token()) else {
        cursor.recover_to_newline();
        return;
    };
    cursor.bump();

    let mut activates_target = false;
    let mut deactivates_source = false;
    if cursor.at(Token::Plus) {
        cursor.bump();
        activates_target = true;
    } else if cursor.eat(Token::Minus).is_some() {
        deactivates_source = true;
    }

    let Some(to_tok) = cursor.bump() else { return };
    let Token::Ident(to) = to_tok.token else { return };
    ensure_participant(seq, to);

    last_create.take();

    let text = if cursor.at(Token::Colon) {
        cursor.bump();
        let text = cursor.rest_of_line_text().0;
        check_label_hygiene(&text, Position::new(line_no, 1), diags);
        text
    } else {
        let (trailing, _) = cursor.rest_of_line_text();
        diags
            .error(Position::new(line_no, 1), "message is missing its ':' body")
            .code("SE-MSG-COLON-MISSING")
            .fix(Fix::new(" : ", "insert the ':' separator"))
            .emit();
        trailing
    };

    if activates_target {
        activate(to, activations, diags, line_no, seq);
    }
    if deactivates_source {
        deactivate(from, activations, diags, line_no, seq);
    }

    seq.events.push(Event::Message(Message {
        from: from.to_string(),
        to: to.to_string(),
        text,
        line_style,
        start_marker,
        end_marker,
        is_async,
        activates_target,
        deactivates_source,
    }));
    let _ = source;
}

fn classify_arrow(token: Token<'_>) -> Option<(LineStyle, MessageMarker, MessageMarker, bool)> {
    use Token::*;
    match token {
        ThinArrow => Some((LineStyle::Solid, MessageMarker::None, MessageMarker::Arrow, false)),
        SolidArrow => Some((LineStyle::Dotted, MessageMarker::None, MessageMarker::Arrow, false)),
        ThinOpenArrow => Some((LineStyle::Solid, MessageMarker::None, MessageMarker::Arrow, true)),
        SolidOpenArrow => Some((LineStyle::Dotted, MessageMarker::None, MessageMarker::Arrow, true)),
        ThinCrossArrow => Some((LineStyle::Solid, MessageMarker::None, MessageMarker::Cross, false)),
        SolidCrossArrow => Some((LineStyle::Dotted, MessageMarker::None, MessageMarker::Cross, false)),
        ThinOpenCircleArrow => Some((LineStyle::Solid, MessageMarker::None, MessageMarker::Open, true)),
        SolidOpenCircleArrow => Some((LineStyle::Dotted, MessageMarker::None, MessageMarker::Open, true)),
        OpenBiArrow => Some((LineStyle::Solid, MessageMarker::Arrow, MessageMarker::Arrow, false)),
        DoubleOpenBiArrow => Some((LineStyle::Dotted, MessageMarker::Arrow, MessageMarker::Arrow, false)),
        _ => None,
    }
}

/// Quote hygiene for message/note text, section 4.4/4.6, mirroring
/// `pie::check_quoted_label_hygiene`. Sequence text is free-form and need
/// not be quoted at all, so this only fires once the raw text itself is
/// wrapped in double quotes.
fn check_label_hygiene(text_raw: &str, pos: Position, diags: &mut Diagnostics) {
    let trimmed = text_raw.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.contains("\\\"") {
        diags
            .error(pos, "escaped quote inside a sequence label")
            .code("SE-LABEL-ESCAPED-QUOTE")
            .hint("use &quot; instead of \\\"")
            .fix(Fix::new(inner.replace("\\\"", "&quot;"), "replace \\\" with &quot;"))
            .emit();
    } else if inner.contains('"') {
        diags
            .error(pos, "unescaped double quote inside a double-quoted sequence label")
            .code("SE-LABEL-DOUBLE-IN-DOUBLE")
            .emit();
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
    fn missing_end_is_flagged_and_fixed() {
        let (seq, diags) = parse("sequenceDiagram\npar Do work\n  A->B: hi\n");
        assert!(seq.events.iter().any(|e| matches!(e, Event::Message(_))));
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("SE-BLOCK-MISSING-END")).unwrap();
        assert_eq!(diag.position, Position::new(4, 1));
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "end\n");
    }

    #[test]
    fn else_inside_critical_is_rewritten() {
        let (_seq, diags) = parse("sequenceDiagram\ncritical Do\n  else Not allowed\nend\n");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("SE-ELSE-IN-CRITICAL")).unwrap();
        assert_eq!(diag.position.line, 3);
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "option");
    }

    #[test]
    fn message_without_colon_is_flagged() {
        let (seq, diags) = parse("sequenceDiagram\nA->B hello\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("SE-MSG-COLON-MISSING")));
        assert_eq!(seq.events.len(), 1);
    }

    #[test]
    fn balanced_blocks_report_no_missing_end() {
        let (seq, diags) = parse("sequenceDiagram\nalt ok\n  A->>B: hi\nelse no\n  A->>B: bye\nend\n");
        assert!(seq.blocks_balanced());
        assert!(!diags.iter().any(|d| d.code.as_deref() == Some("SE-BLOCK-MISSING-END")));
    }

    #[test]
    fn deactivate_without_activate_is_flagged() {
        let (_seq, diags) = parse("sequenceDiagram\ndeactivate A\n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("SE-DEACTIVATE-NO-ACTIVE")));
    }

    #[test]
    fn quoted_message_text_with_escaped_quote_is_flagged() {
        let (_seq, diags) = parse("sequenceDiagram\nA->>B: \"Say \\\"hi\\\" there\"\n");
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("SE-LABEL-ESCAPED-QUOTE")).unwrap();
        assert_eq!(diag.fix.as_ref().unwrap().replacement, "Say &quot;hi&quot; there");
    }

    #[test]
    fn unquoted_message_text_is_never_flagged_for_quote_hygiene() {
        let (_seq, diags) = parse("sequenceDiagram\nA->>B: just some text\n");
        assert!(!diags.iter().any(|d| d.code.as_deref() == Some("SE-LABEL-ESCAPED-QUOTE")));
        assert!(!diags.iter().any(|d| d.code.as_deref() == Some("SE-LABEL-DOUBLE-IN-DOUBLE")));
    }

    #[test]
    fn double_in_double_quoted_text_is_never_fixed() {
        let mut diags = Diagnostics::new();
        check_label_hygiene("\"hi \"there\" now\"", Position::new(1, 1), &mut diags);
        let diag = diags.iter().find(|d| d.code.as_deref() == Some("SE-LABEL-DOUBLE-IN-DOUBLE")).unwrap();
        assert!(diag.fix.is_none());
    }
}
