//! Shared vector-output helpers: XML escaping, character-width label
//! wrapping, and the `<defs>` marker block every family's drawer prepends
//! to its output (arrowheads, open circles, cross tips), per §4.7's
//! "ordered groups: defs, clusters, edges, nodes" vector-output rule.

pub const PER_CHAR_WIDTH: f64 = 7.0;
pub const LINE_HEIGHT: f64 = 18.0;
pub const PADDING: f64 = 12.0;

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Wraps `text` into lines no wider than `max_width` (estimated via
/// `PER_CHAR_WIDTH`), capped at `max_lines`; the last kept line gets an
/// ellipsis if content was dropped.
pub fn wrap_label(text: &str, max_width: f64, max_lines: usize) -> Vec<String> {
    let chars_per_line = ((max_width / PER_CHAR_WIDTH).floor() as usize).max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in words {
        let candidate = if current.is_empty() { word.to_string() } else { format!("{current} {word}") };
        if candidate.chars().count() > chars_per_line && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
        if lines.len() == max_lines {
            break;
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
    }
    if let Some(last) = lines.last_mut() {
        if last.chars().count() > chars_per_line {
            let truncated: String = last.chars().take(chars_per_line.saturating_sub(1)).collect();
            *last = format!("{truncated}…");
        }
    }
    lines
}

pub fn defs_block() -> String {
    r##"<defs>
    <marker id="arrowhead" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="7" markerHeight="7" orient="auto-start-reverse">
      <path d="M0,0 L10,5 L0,10 z" fill="#333333"/>
    </marker>
    <marker id="circle-end" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="6" markerHeight="6">
      <circle cx="5" cy="5" r="4" fill="#ffffff" stroke="#333333"/>
    </marker>
    <marker id="cross-end" viewBox="0 0 10 10" refX="5" refY="5" markerWidth="6" markerHeight="6">
      <path d="M1,1 L9,9 M9,1 L1,9" stroke="#333333" stroke-width="1.5"/>
    </marker>
  </defs>"##
        .to_string()
}

pub fn text_lines(x: f64, y: f64, lines: &[String], anchor: &str) -> String {
    let mut out = String::new();
    let start_y = y - (lines.len() as f64 - 1.0) * LINE_HEIGHT / 2.0;
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"{anchor}\" font-size=\"12\" dominant-baseline=\"middle\">{}</text>",
            start_y + i as f64 * LINE_HEIGHT,
            escape_xml(line)
        ));
    }
    out
}

pub fn svg_document(width: f64, height: f64, body: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width:.1} {height:.1}\" width=\"{width:.1}\" height=\"{height:.1}\">\n{}\n{body}\n</svg>",
        defs_block()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_covers_all_special_chars() {
        assert_eq!(escape_xml("a < b & c > \"d\""), "a &lt; b &amp; c &gt; &quot;d&quot;");
    }

    #[test]
    fn wrap_label_splits_on_width() {
        let lines = wrap_label("a fairly long label here", 40.0, 3);
        assert!(lines.len() > 1);
        assert!(lines.len() <= 3);
    }

    #[test]
    fn wrap_label_handles_empty_text() {
        assert_eq!(wrap_label("", 100.0, 2), vec![String::new()]);
    }
}
