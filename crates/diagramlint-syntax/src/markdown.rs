//! Markdown fence extraction, section 4.11, grounded in the fence-scanning
//! shape of `other_examples/.../par-term/.../diagrams/renderer.rs`'s
//! `parse_diagram_blocks` (scan for fences, classify by info word, collect
//! body lines between open and close).

const RECOGNIZED_INFO_WORDS: &[&str] = &["mermaid", "mmd", "mermaidjs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub info: String,
    pub fence: String,
}

struct FenceOpen<'a> {
    marker_char: char,
    marker_len: usize,
    info: &'a str,
}

fn parse_fence_open(line: &str) -> Option<FenceOpen<'_>> {
    let trimmed = line.trim_start();
    let marker_char = trimmed.chars().next()?;
    if marker_char != '`' && marker_char != '~' {
        return None;
    }
    let marker_len = trimmed.chars().take_while(|&c| c == marker_char).count();
    if marker_len < 3 {
        return None;
    }
    let info = trimmed[marker_len..].trim();
    Some(FenceOpen { marker_char, marker_len, info })
}

fn is_matching_close(line: &str, marker_char: char, marker_len: usize) -> bool {
    let trimmed = line.trim();
    if trimmed.chars().any(|c| c != marker_char) {
        return false;
    }
    trimmed.chars().count() >= marker_len && !trimmed.is_empty()
}

fn info_word_recognized(info: &str) -> bool {
    let word = info.split_whitespace().next().unwrap_or("");
    RECOGNIZED_INFO_WORDS.contains(&word)
}

/// Scans `text` for fenced blocks whose info word names this notation.
/// Each returned block carries its 1-based first-content line and its
/// closing-fence line.
pub fn extract_blocks(text: &str) -> Vec<ExtractedBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line_no = (i + 1) as u32;
        if let Some(open) = parse_fence_open(lines[i]) {
            if info_word_recognized(open.info) {
                let info = open.info.to_string();
                let fence: String = std::iter::repeat(open.marker_char).take(open.marker_len).collect();
                let start_line = line_no + 1;
                let mut j = i + 1;
                let mut end_line = None;
                while j < lines.len() {
                    if is_matching_close(lines[j], open.marker_char, open.marker_len) {
                        end_line = Some((j + 1) as u32);
                        break;
                    }
                    j += 1;
                }
                let close_idx = j;
                let content = lines[(i + 1)..close_idx.min(lines.len())].join("\n");
                let end_line = end_line.unwrap_or(lines.len() as u32);
                blocks.push(ExtractedBlock { content, start_line, end_line, info, fence });
                i = close_idx + 1;
                continue;
            }
        }
        i += 1;
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_mermaid_block() {
        let doc = "# Title\n\n```mermaid\nflowchart TD\nA --> B\n```\n\nTail\n";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "flowchart TD\nA --> B");
        assert_eq!(blocks[0].start_line, 4);
        assert_eq!(blocks[0].end_line, 6);
        assert_eq!(blocks[0].info, "mermaid");
    }

    #[test]
    fn ignores_fences_with_other_info_words() {
        let doc = "```rust\nfn main() {}\n```\n";
        assert!(extract_blocks(doc).is_empty());
    }

    #[test]
    fn round_trips_against_original_lines() {
        let doc = "intro\n```mermaid\npie\n\"A\" : 1\n```\nend\n";
        let blocks = extract_blocks(doc);
        let lines: Vec<&str> = doc.lines().collect();
        for block in &blocks {
            for (offset, content_line) in block.content.lines().enumerate() {
                let doc_line_idx = (block.start_line as usize - 1) + offset;
                assert_eq!(lines[doc_line_idx], content_line);
            }
        }
    }

    #[test]
    fn tilde_fences_are_recognized_too() {
        let doc = "~~~~mermaid\npie\n\"A\" : 1\n~~~~\n";
        let blocks = extract_blocks(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].fence, "~~~~");
    }
}
