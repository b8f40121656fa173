//! Frontmatter reader, section 4.11 and the closed recognized-key set in
//! section 6. Recognized only when the first non-BOM line is exactly
//! `---`. The grammar inside is a narrow, two-level-indented key/value
//! form; this is not a general YAML parser, only enough of one to read the
//! keys this notation actually recognizes.

use diagramlint_core::frontmatter::{Config, ConfigValue, Frontmatter};
use indexmap::IndexMap;

pub fn read_frontmatter(text: &str) -> (Option<Frontmatter>, &str) {
    let stripped = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = stripped.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end_matches(['\n', '\r']) != "---" {
        return (None, text);
    }

    let inner_start = first.len();
    let mut raw_len = first.len();
    let mut inner_end = None;
    let mut closed = false;
    for line in lines {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            inner_end = Some(raw_len);
            raw_len += line.len();
            closed = true;
            break;
        }
        raw_len += line.len();
    }

    if !closed {
        return (None, text);
    }
    let inner_end = inner_end.unwrap_or(inner_start);

    let raw = stripped[..raw_len].to_string();
    let inner = &stripped[inner_start..inner_end];
    let (config, theme_variables) = parse_inner(inner);
    let body = &stripped[raw_len..];

    (Some(Frontmatter { raw, body: body.to_string(), config, theme_variables }), body)
}

fn parse_inner(inner: &str) -> (Option<Config>, Option<IndexMap<String, ConfigValue>>) {
    let mut config = Config::default();
    let mut have_config = false;
    let mut theme_variables: IndexMap<String, ConfigValue> = IndexMap::new();

    #[derive(PartialEq)]
    enum Section {
        None,
        Config,
        ConfigPie,
        ThemeVariables,
    }

    let mut section = Section::None;

    for raw_line in inner.lines() {
        if raw_line.trim().is_empty() {
            continue;
        }
        let indent = raw_line.chars().take_while(|c| *c == ' ').count();
        let line = raw_line.trim();

        if indent == 0 {
            if line == "config:" {
                section = Section::Config;
            } else if line == "themeVariables:" {
                section = Section::ThemeVariables;
            } else {
                section = Section::None;
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else { continue };
        let key = key.trim();
        let value = value.trim();

        match section {
            Section::Config if indent == 2 && key == "pie" && value.is_empty() => {
                section = Section::ConfigPie;
            }
            Section::Config if indent == 2 => {
                // Unknown top-level config key; silently ignored.
            }
            Section::ConfigPie if indent == 4 && key == "textPosition" => {
                if let Ok(n) = value.parse::<f64>() {
                    config.pie.text_position = Some(n);
                    have_config = true;
                }
            }
            Section::ThemeVariables if indent == 2 => {
                theme_variables.insert(key.to_string(), parse_value(value));
            }
            _ => {}
        }
    }

    let config = if have_config { Some(config) } else { None };
    let theme_variables = if theme_variables.is_empty() { None } else { Some(theme_variables) };
    (config, theme_variables)
}

fn parse_value(raw: &str) -> ConfigValue {
    if let Ok(n) = raw.parse::<f64>() {
        return ConfigValue::Number(n);
    }
    if raw == "true" {
        return ConfigValue::Bool(true);
    }
    if raw == "false" {
        return ConfigValue::Bool(false);
    }
    if (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
    {
        return ConfigValue::String(raw[1..raw.len() - 1].to_string());
    }
    ConfigValue::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frontmatter_when_first_line_is_not_triple_dash() {
        let (fm, body) = read_frontmatter("pie\n\"A\" : 1\n");
        assert!(fm.is_none());
        assert_eq!(body, "pie\n\"A\" : 1\n");
    }

    #[test]
    fn reads_pie_text_position_and_theme_variables() {
        let doc = "---\nconfig:\n  pie:\n    textPosition: 0.75\nthemeVariables:\n  pie1: \"#ff0000\"\n---\npie\n\"A\" : 1\n";
        let (fm, body) = read_frontmatter(doc);
        let fm = fm.expect("frontmatter detected");
        assert_eq!(fm.config.unwrap().pie.text_position, Some(0.75));
        let theme = fm.theme_variables.unwrap();
        assert_eq!(theme.get("pie1"), Some(&ConfigValue::String("#ff0000".to_string())));
        assert_eq!(body, "pie\n\"A\" : 1\n");
    }

    #[test]
    fn unclosed_frontmatter_is_not_recognized() {
        let doc = "---\nconfig:\n  pie:\n    textPosition: 1\npie\n\"A\" : 1\n";
        let (fm, body) = read_frontmatter(doc);
        assert!(fm.is_none());
        assert_eq!(body, doc);
    }
}
