//! Command-line surface, section 6: `diagramlint [options] <file|directory|->`.
//! Built with clap's builder API (`Command`/`Arg`) rather than the derive
//! macros — there's exactly one command here, not a subcommand tree.

use clap::{Arg, ArgAction, Command};

pub struct Invocation {
    pub target: String,
    pub format: Format,
    pub strict: bool,
    pub fix: Option<FixLevel>,
    pub dry_run: bool,
    pub print_fixed: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub use_gitignore: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FixLevel {
    Safe,
    All,
}

pub fn build_command() -> Command {
    Command::new("diagramlint")
        .about("Lint, auto-fix, and render Mermaid-style diagram notation")
        .arg(
            Arg::new("target")
                .value_name("FILE|DIRECTORY|-")
                .required(true)
                .help("A diagram file, a directory to scan, or - for stdin"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("text|json")
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Report format"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Treat warnings as failures"),
        )
        .arg(
            Arg::new("fix")
                .long("fix")
                .value_name("safe|all")
                .num_args(0..=1)
                .default_missing_value("safe")
                .value_parser(["safe", "all"])
                .help("Auto-fix diagnostics (defaults to safe fixes only)"),
        )
        .arg(
            Arg::new("dry_run")
                .long("dry-run")
                .short('n')
                .action(ArgAction::SetTrue)
                .help("Report what --fix would change without writing files"),
        )
        .arg(
            Arg::new("print_fixed")
                .long("print-fixed")
                .action(ArgAction::SetTrue)
                .help("Print the fixed source to stdout instead of writing it back"),
        )
        .arg(
            Arg::new("include")
                .long("include")
                .short('I')
                .value_name("GLOB")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Only scan files matching this glob (repeatable, comma-separated)"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .short('E')
                .value_name("GLOB")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Skip files matching this glob"),
        )
        .arg(
            Arg::new("no_gitignore")
                .long("no-gitignore")
                .action(ArgAction::SetTrue)
                .help("Don't respect .gitignore when scanning a directory"),
        )
        .arg(
            Arg::new("gitignore")
                .long("gitignore")
                .action(ArgAction::SetTrue)
                .conflicts_with("no_gitignore")
                .hide(true),
        )
}

pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Invocation, clap::Error> {
    let matches = build_command().try_get_matches_from(args)?;

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => Format::Json,
        _ => Format::Text,
    };
    let fix = matches.get_one::<String>("fix").map(|level| match level.as_str() {
        "all" => FixLevel::All,
        _ => FixLevel::Safe,
    });
    let include = matches.get_many::<String>("include").map(|v| v.cloned().collect()).unwrap_or_default();
    let exclude = matches.get_many::<String>("exclude").map(|v| v.cloned().collect()).unwrap_or_default();

    Ok(Invocation {
        target: matches.get_one::<String>("target").cloned().unwrap_or_default(),
        format,
        strict: matches.get_flag("strict"),
        fix,
        dry_run: matches.get_flag("dry_run"),
        print_fixed: matches.get_flag("print_fixed"),
        include,
        exclude,
        use_gitignore: !matches.get_flag("no_gitignore"),
    })
}
