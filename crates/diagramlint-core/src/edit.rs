use crate::position::Position;

/// A half-open `[start, end)` text replacement in 1-based line/column space.
/// An insertion has `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: Position,
    pub end: Position,
    pub replacement: String,
}

impl Edit {
    pub fn new(start: Position, end: Position, replacement: impl Into<String>) -> Self {
        Self { start, end, replacement: replacement.into() }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self { start: at, end: at, replacement: text.into() }
    }

    fn overlaps(&self, other: &Edit) -> bool {
        let (a0, a1) = ((self.start.line, self.start.column), (self.end.line, self.end.column));
        let (b0, b1) = ((other.start.line, other.start.column), (other.end.line, other.end.column));
        a0 < b1 && b0 < a1 || (a0 == a1 && a0 >= b0 && a0 < b1) || (b0 == b1 && b0 >= a0 && b0 < a1)
    }
}

/// Applies a set of edits to `text`, splitting into lines and columns
/// measured in UTF-8 byte-free code-point offsets. Edits are sorted by
/// descending start position and applied right-to-left so that earlier
/// edits' offsets are never invalidated by later ones (per section 4.3's
/// "compose by applying from last position to first" rule). Overlapping
/// edits are resolved by keeping the earlier-generated one (stable sort)
/// and discarding the later conflicting edit.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut lines: Vec<Vec<char>> = split_lines(text);

    // Conflicts are resolved in generation order: the earlier-generated
    // edit wins and later overlapping edits are discarded.
    let mut accepted: Vec<&Edit> = Vec::new();
    'outer: for candidate in edits {
        for already in &accepted {
            if candidate.overlaps(already) {
                continue 'outer;
            }
        }
        accepted.push(candidate);
    }

    // Application itself proceeds right-to-left so earlier edits' offsets
    // are never invalidated by edits applied after them.
    accepted.sort_by(|a, b| (b.start.line, b.start.column).cmp(&(a.start.line, a.start.column)));

    for edit in accepted {
        apply_single(&mut lines, edit);
    }

    join_lines(&lines)
}

fn split_lines(text: &str) -> Vec<Vec<char>> {
    if text.is_empty() {
        return vec![Vec::new()];
    }
    let mut out: Vec<Vec<char>> = Vec::new();
    let mut current = Vec::new();
    for ch in text.chars() {
        if ch == '\n' {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    out.push(current);
    out
}

fn join_lines(lines: &[Vec<char>]) -> String {
    lines.iter().map(|l| l.iter().collect::<String>()).collect::<Vec<_>>().join("\n")
}

fn apply_single(lines: &mut Vec<Vec<char>>, edit: &Edit) {
    let start_line = (edit.start.line as usize).saturating_sub(1);
    let end_line = (edit.end.line as usize).saturating_sub(1);
    let start_col = (edit.start.column as usize).saturating_sub(1);
    let end_col = (edit.end.column as usize).saturating_sub(1);

    if start_line >= lines.len() {
        while lines.len() <= start_line {
            lines.push(Vec::new());
        }
    }
    if end_line >= lines.len() {
        while lines.len() <= end_line {
            lines.push(Vec::new());
        }
    }

    let mut head = lines[start_line][..start_col.min(lines[start_line].len())].to_vec();
    let tail_line = &lines[end_line];
    let mut tail = tail_line[end_col.min(tail_line.len())..].to_vec();

    let mut replacement_lines = split_lines(&edit.replacement);
    if replacement_lines.len() == 1 {
        head.append(&mut replacement_lines[0]);
        head.append(&mut tail);
        lines.splice(start_line..=end_line, std::iter::once(head));
    } else {
        let last_index = replacement_lines.len() - 1;
        head.append(&mut replacement_lines[0]);
        replacement_lines[last_index].append(&mut tail);
        let middle = replacement_lines[1..].to_vec();
        let mut new_lines = vec![head];
        new_lines.extend(middle);
        lines.splice(start_line..=end_line, new_lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32) -> Position {
        Position::new(line, column)
    }

    #[test]
    fn replace_arrow_token() {
        let text = "flowchart TD\nA -> B\n";
        let edit = Edit::new(pos(2, 3), pos(2, 5), "-->");
        let out = apply_edits(text, &[edit]);
        assert_eq!(out, "flowchart TD\nA --> B\n");
    }

    #[test]
    fn insertion_has_equal_start_and_end() {
        let text = "pie\nDogs : 10\n";
        let edit = Edit::insert(pos(2, 1), "\"");
        let after = Edit::insert(pos(2, 6), "\"");
        let out = apply_edits(text, &[edit, after]);
        assert_eq!(out, "pie\n\"Dogs\" : 10\n");
    }

    #[test]
    fn conflicting_edits_keep_earlier_generated() {
        let text = "A -> B\n";
        let first = Edit::new(pos(1, 3), pos(1, 5), "-->");
        let second = Edit::new(pos(1, 1), pos(1, 6), "whole line replaced");
        let out = apply_edits(text, &[first, second]);
        assert_eq!(out, "A --> B\n");
    }

    #[test]
    fn multiline_replacement_inserts_new_lines() {
        let text = "sequenceDiagram\npar Do work\n  A->B: hi\n";
        let edit = Edit::insert(pos(4, 1), "end\n");
        let out = apply_edits(text, &[edit]);
        assert_eq!(out, "sequenceDiagram\npar Do work\n  A->B: hi\nend\n");
    }
}
