//! enumgen CLI - enum-ish helper methods for Go constant groups.
//!
//! Meant to run from `//go:generate`:
//!
//! ```go
//! //go:generate enumgen --pkg paint Color Finish
//! ```
//!
//! Features:
//! - Reads the package's Go sources directly (build tags honored)
//! - Optional JSON symbol table input (`--symbols`)
//! - enumgen.toml defaults, overridden by command-line options
//! - Output rewritten only when its content changes

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use std::path::{Path, PathBuf};

use enumgen_core::{
    init_structured_logging, load_config, load_config_file, log_error, log_info, log_warn,
    parse_tags, render_json, render_plain, write_output, CommandFormatter, Enumgen,
    EnumgenConfig, EnumgenError, JsonSymbolProvider, RunReport, DEFAULT_OUTPUT, STDOUT,
};

#[derive(Parser, Debug)]
#[command(
    name = "enumgen",
    author,
    version,
    about = "Generate enum-ish helper methods for Go constant groups"
)]
pub struct Cli {
    /// Named types to generate methods for
    #[arg(value_name = "TYPE", required = true)]
    types: Vec<String>,

    /// Package to load (import path, directory, or package name)
    #[arg(long, env = "GOPACKAGE")]
    pkg: Option<String>,

    /// Output file, `-` for stdout [default: enum_gen.go]
    #[arg(long, value_name = "FILE")]
    out: Option<String>,

    /// Comma-separated build tags
    #[arg(long)]
    tags: Option<String>,

    /// Generate Set (flag.Value) [default: true]
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    flag: Option<bool>,

    /// Generate MarshalText/UnmarshalText (experimental) [default: false]
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    marshal: Option<bool>,

    /// Format the output [default: true]
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    format: Option<bool>,

    /// Read the symbol table from a JSON file instead of Go sources
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,

    /// Configuration file [default: ./enumgen.toml if present]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

/// Options after merging the command line, config file and defaults.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    package: String,
    out: String,
    tags: Vec<String>,
    flag: bool,
    marshal: bool,
    format: bool,
    format_command: Option<Vec<String>>,
}

/// Command line beats config file beats defaults.
fn resolve_settings(cli: &Cli, config: Option<&EnumgenConfig>) -> Settings {
    let file = config.map(EnumgenConfig::generate).unwrap_or_default();

    Settings {
        package: cli.pkg.clone().unwrap_or_default(),
        out: cli
            .out
            .clone()
            .or(file.out)
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        tags: match &cli.tags {
            Some(list) => parse_tags(list),
            None => file.tags.unwrap_or_default(),
        },
        flag: cli.flag.or(file.flag).unwrap_or(true),
        marshal: cli.marshal.or(file.marshal).unwrap_or(false),
        format: cli.format.or(file.format).unwrap_or(true),
        format_command: config
            .and_then(EnumgenConfig::format_command)
            .map(<[String]>::to_vec),
    }
}

fn find_config(cli: &Cli, cwd: &Path) -> Result<Option<EnumgenConfig>> {
    match &cli.config {
        Some(path) => Ok(Some(load_config_file(path)?)),
        None => Ok(load_config(cwd)?),
    }
}

/// Name used for the output in formatter diagnostics.
fn output_name(out: &str) -> String {
    if out == STDOUT {
        return DEFAULT_OUTPUT.to_string();
    }
    Path::new(out)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| out.to_string())
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let config = find_config(cli, &cwd)?;
    let settings = resolve_settings(cli, config.as_ref());

    if settings.marshal {
        log_warn("MarshalText/UnmarshalText generation is experimental");
    }

    let mut enumgen = Enumgen::new(&settings.package)
        .tags(settings.tags.iter().cloned())
        .flag(settings.flag)
        .marshal(settings.marshal)
        .format(settings.format)
        .output_name(output_name(&settings.out));

    if let Some(path) = &cli.symbols {
        enumgen = enumgen.with_provider(JsonSymbolProvider::new(path));
    }
    if let Some(argv) = &settings.format_command {
        enumgen = enumgen.with_formatter(CommandFormatter::from_argv(argv)?);
    }

    let generated = enumgen.generate(&cli.types)?;
    let outcome = write_output(&settings.out, &generated.source)
        .with_context(|| format!("Failed to write {}", settings.out))?;

    log_info(&format!(
        "{} {} for {} type(s)",
        outcome,
        settings.out,
        generated.groups.len()
    ));

    // Generated code owns stdout when `--out -` is used.
    let report = RunReport::new(&generated, &settings.out, outcome);
    let text = if cli.json {
        format!("{}\n", render_json(&report))
    } else {
        render_plain(&report)
    };
    if settings.out == STDOUT {
        eprint!("{}", text);
    } else {
        print!("{}", text);
    }
    Ok(())
}

/// Exit code for a failed run: 2 for usage errors, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EnumgenError>() {
        Some(e) if e.is_usage() => 2,
        _ => 1,
    }
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] enumgen internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        let code = exit_code(&err);
        log_error(&format!("{:#}", err));
        eprintln!("enumgen: {:#}", err);
        if code == 2 {
            eprintln!("{}", Cli::command().render_usage());
        }
        std::process::exit(code);
    }
}
