//! Drives one invocation: resolve the target to a list of files (or
//! stdin), run validate/fix/render per file, print reports, and compute
//! the process exit code per §6's exit-code table.

use std::io::Read;
use std::path::{Path, PathBuf};

use diagramlint_core::Diagnostics;
use diagramlint_syntax::api;
use diagramlint_syntax::fixengine::FixLevel as EngineFixLevel;
use globset::{Glob, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::args::{Format, Invocation};

/// Default glob used when a directory target carries no `--include`: this
/// notation has no single pinned file extension, so the CLI picks the
/// conventional ones (`.mmd`/`.mermaid`) plus Markdown files, which may
/// embed fenced blocks (§4.11).
const DEFAULT_INCLUDE: &[&str] = &["*.mmd", "*.mermaid", "*.md", "*.markdown"];

pub fn execute(invocation: &Invocation) -> i32 {
    if invocation.target == "-" {
        return run_stdin(invocation);
    }

    let path = Path::new(&invocation.target);
    if path.is_file() {
        return run_file(invocation, path);
    }
    if path.is_dir() {
        return run_directory(invocation, path);
    }

    eprintln!("error: no such file or directory: {}", invocation.target);
    1
}

fn run_stdin(invocation: &Invocation) -> i32 {
    let mut text = String::new();
    if std::io::stdin().read_to_string(&mut text).is_err() {
        eprintln!("error: failed to read stdin");
        return 1;
    }
    process_source(invocation, "<stdin>", &text, None)
}

fn run_file(invocation: &Invocation, path: &Path) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", path.display());
            return 1;
        }
    };
    process_source(invocation, &path.display().to_string(), &text, Some(path))
}

fn run_directory(invocation: &Invocation, dir: &Path) -> i32 {
    let files = discover_files(invocation, dir);
    if files.is_empty() {
        eprintln!("error: no matching files under {}", dir.display());
        return 1;
    }

    let mut worst = 0;
    for file in files {
        let code = run_file(invocation, &file);
        worst = worst.max(code);
    }
    worst
}

fn discover_files(invocation: &Invocation, dir: &Path) -> Vec<PathBuf> {
    let include_patterns = if invocation.include.is_empty() {
        DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
    } else {
        invocation.include.clone()
    };
    let include_set = build_globset(&include_patterns);
    let exclude_set = build_globset(&invocation.exclude);

    let mut walker = WalkBuilder::new(dir);
    walker.git_ignore(invocation.use_gitignore).git_exclude(invocation.use_gitignore).hidden(false);

    let mut files = Vec::new();
    for entry in walker.build().filter_map(Result::ok) {
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if !include_set.is_match(path) {
            continue;
        }
        if exclude_set.is_match(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    files
}

fn build_globset(patterns: &[String]) -> globset::GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().expect("empty globset always builds"))
}

fn process_source(invocation: &Invocation, display_name: &str, text: &str, write_path: Option<&Path>) -> i32 {
    if let Some(level) = invocation.fix {
        return run_fix(invocation, display_name, text, write_path, level);
    }

    let result = api::validate(text, invocation.strict);
    report(invocation, display_name, text, &result.diagnostics);
    exit_code(&result.diagnostics, invocation.strict)
}

fn run_fix(
    invocation: &Invocation,
    display_name: &str,
    text: &str,
    write_path: Option<&Path>,
    level: crate::args::FixLevel,
) -> i32 {
    let engine_level = match level {
        crate::args::FixLevel::Safe => EngineFixLevel::Safe,
        crate::args::FixLevel::All => EngineFixLevel::All,
    };
    let result = api::fix(text, engine_level);

    if invocation.print_fixed {
        print!("{}", result.fixed);
    } else if !invocation.dry_run && result.fixed != text {
        if let Some(path) = write_path {
            if let Err(e) = std::fs::write(path, &result.fixed) {
                eprintln!("error: failed to write {}: {e}", path.display());
                return 1;
            }
        }
    }

    report(invocation, display_name, &result.fixed, &result.diagnostics);
    exit_code(&result.diagnostics, invocation.strict)
}

fn report(invocation: &Invocation, display_name: &str, source: &str, diagnostics: &Diagnostics) {
    match invocation.format {
        Format::Text => {
            let rendered = api::to_text(diagnostics, source, Some(display_name));
            if !rendered.is_empty() {
                print!("{rendered}");
            }
        }
        Format::Json => {
            let value = api::to_json(display_name, diagnostics);
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
    }
}

fn exit_code(diagnostics: &Diagnostics, strict: bool) -> i32 {
    let failing = diagnostics.has_errors() || (strict && diagnostics.has_warnings());
    if failing {
        1
    } else {
        0
    }
}
