//! Schema Synth CLI
//!
//! Command-line interface for generating API types from document catalogs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use schema_synth::{
    extract_docs, lint, load_catalog, load_json, progress_type, project, render_sdl,
    select_member, Document, DocumentKind, FileStatus, NamedType, OutputType, Severity,
    SynthOptions, TypeSynthesizer, TYPENAME_KEY,
};
use serde_json::Value;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-synth")]
#[command(about = "Generate typed API schemas from documented configuration schemas")]
#[command(version)]
struct Cli {
    /// Log synthesis advisories (undocumented fields, degraded unions)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate API types for every document kind in a catalog
    Generate {
        /// Catalog file
        catalog: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Sdl)]
        format: Format,

        /// Fail on unions of different scalars instead of degrading them
        #[arg(long)]
        strict_unions: bool,

        /// Report progress steps as JSON lines on stderr
        #[arg(long)]
        progress: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Resolve a document against its generated type
    Render {
        /// Catalog file
        catalog: PathBuf,

        /// Document file (JSON)
        document: PathBuf,

        /// Document kind (config, project, app, service, command)
        #[arg(long, short)]
        kind: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract field documentation from a docstring file
    Docs {
        /// File containing the docstring
        file: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Lint catalog files (syntax, structure, documentation, conversion)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Sdl,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            catalog,
            format,
            strict_unions,
            progress,
            output,
        } => run_generate(&catalog, format, strict_unions, progress, output),

        Commands::Render {
            catalog,
            document,
            kind,
            pretty,
        } => run_render(&catalog, &document, &kind, pretty),

        Commands::Docs { file, pretty } => run_docs(&file, pretty),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr; `RUST_LOG` applies unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn run_generate(
    catalog_path: &Path,
    format: Format,
    strict_unions: bool,
    progress: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let catalog = load_catalog(catalog_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = SynthOptions::new().strict_unions(strict_unions);
    let synth = TypeSynthesizer::with_options(catalog, options);
    synth
        .synthesize_catalog(|step| {
            if progress {
                if let Ok(line) = serde_json::to_string(&step) {
                    eprintln!("{}", line);
                }
            }
        })
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let mut types = synth.types();
    if progress {
        types.push(NamedType::Object(progress_type()));
    }

    let rendered = match format {
        Format::Sdl => render_sdl(&types),
        Format::Json => serde_json::to_string_pretty(&serde_json::json!({ "types": types }))
            .map_err(|e| {
                eprintln!("Error serializing output: {}", e);
                2u8
            })?,
    };

    write_output(output.as_deref(), &rendered)
}

fn run_render(catalog_path: &Path, document_path: &Path, kind: &str, pretty: bool) -> Result<(), u8> {
    let Some(kind) = DocumentKind::parse(kind) else {
        let known: Vec<&str> = DocumentKind::ALL.iter().map(DocumentKind::as_str).collect();
        eprintln!(
            "Error: unknown document kind '{}' (expected one of: {})",
            kind,
            known.join(", ")
        );
        return Err(2);
    };

    let catalog = load_catalog(catalog_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let value = load_json(document_path).map_err(|e| {
        eprintln!("Error loading document: {}", e);
        e.exit_code() as u8
    })?;
    let Some(document) = Document::from_value(kind, value) else {
        eprintln!("Error: document must be a JSON object");
        return Err(2);
    };

    let synth = TypeSynthesizer::new(catalog);
    let ty = synth.document_type(kind).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let projected = match ty {
        OutputType::Object(object) => project(&object, &document),
        OutputType::Union(union) => {
            let Some(member) = select_member(&union, &document.doc) else {
                eprintln!("Error: document matches no variant of {}", union.name);
                return Err(2);
            };
            let mut projected = serde_json::Map::new();
            projected.insert(TYPENAME_KEY.to_string(), Value::String(member.name.clone()));
            projected.extend(project(member, &document));
            projected
        }
        OutputType::Scalar(_) | OutputType::List(_) => {
            eprintln!("Error: {} does not generate an object type", kind);
            return Err(2);
        }
    };

    print_json(&Value::Object(projected), pretty)
}

fn run_docs(file: &Path, pretty: bool) -> Result<(), u8> {
    let docstring = std::fs::read_to_string(file).map_err(|e| {
        eprintln!("Error reading {}: {}", file.display(), e);
        3u8
    })?;
    let docs = extract_docs(&docstring).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let value = serde_json::to_value(&docs).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    print_json(&value, pretty)
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", json_output);
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(path, content).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let json_output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json_output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
