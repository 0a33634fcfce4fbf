//! CLI entry point for the mapping resolver.
//!
//! Loads settings and a metadata document, resolves every declared mapping
//! and reports plans and diagnostics as text or JSON.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use mapweave::display::{THEME, render_report};
use mapweave::error::ErrorContext;
use mapweave::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use mapweave::{Diagnostic, MapError, MappingEngine, RunReport, Settings, TypeCatalog, TypeProvider};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Resolve declarative type-to-type mappings into conversion plans
#[derive(Parser)]
#[command(
    name = "mapweave",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolve declarative type mappings into conversion plans",
    long_about = "Match members between annotated source and target types, choose a conversion \
                  for each pair and report configuration problems.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .mapweave/settings.toml with default values
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display the effective settings
    Config,

    /// Resolve every mapping declared in a metadata document
    #[command(
        after_help = "Examples:\n  mapweave resolve types.json\n  mapweave resolve types.json --only UserViewModel --json\n\nJSON paths:\n  .data.outcomes[].plan.pairs[].strategy.kind\n  .data.outcomes[].diagnostics[].code"
    )]
    Resolve {
        /// Metadata document (JSON)
        metadata: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Only report mappings involving this type
        #[arg(long, value_name = "TYPE")]
        only: Option<String>,

        /// Number of threads to use (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Also write the resolved plans to this file as JSON
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Report diagnostics without printing plans
    Check {
        /// Metadata document (JSON)
        metadata: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Payload of `mapweave check --json`
#[derive(Serialize)]
struct CheckData<'a> {
    errors: usize,
    warnings: usize,
    diagnostics: Vec<&'a Diagnostic>,
}

fn main() {
    let cli = Cli::parse();
    let format = match &cli.command {
        Commands::Resolve { json, .. } | Commands::Check { json, .. } => {
            OutputFormat::from_json_flag(*json)
        }
        _ => OutputFormat::Text,
    };

    let code = match run(cli) {
        Ok(code) => code,
        Err(error) => report_error(&error, format),
    };
    std::process::exit(code.into());
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Init must work even when the existing settings file is broken
    if let Commands::Init { force } = cli.command {
        setup_logging(cli.verbose);
        return init(force);
    }

    let mut settings = load_settings(cli.config.as_deref())?;
    setup_logging(cli.verbose || settings.debug);

    match cli.command {
        Commands::Init { force } => init(force),

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        Commands::Resolve {
            metadata,
            json,
            only,
            threads,
            output,
        } => {
            if let Some(threads) = threads {
                settings.resolution.parallel_threads = threads;
            }
            let request = Request {
                metadata: &metadata,
                only: only.as_deref(),
                output: output.as_deref(),
                format: OutputFormat::from_json_flag(json),
                show_plans: true,
            };
            resolve(&settings, request)
        }

        Commands::Check { metadata, json } => {
            let request = Request {
                metadata: &metadata,
                only: None,
                output: None,
                format: OutputFormat::from_json_flag(json),
                show_plans: false,
            };
            resolve(&settings, request)
        }
    }
}

fn init(force: bool) -> anyhow::Result<ExitCode> {
    let root = std::env::current_dir().context("Failed to determine current directory")?;
    let path = Settings::init_config_file(&root, force).map_err(|e| MapError::ConfigError {
        reason: format!("{e}{}", if force { "" } else { " (use --force to overwrite)" }),
    })?;
    println!(
        "{}",
        THEME.success_with_icon(&format!("Created configuration file at: {}", path.display()))
    );
    println!("Edit this file to customize your settings.");
    Ok(ExitCode::Success)
}

fn load_settings(path: Option<&Path>) -> Result<Settings, MapError> {
    let settings = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| MapError::ConfigError {
        reason: e.to_string(),
    })?;
    settings
        .validate()
        .map_err(|reason| MapError::ConfigError { reason })?;
    Ok(settings)
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` wins when set.
fn setup_logging(verbose: bool) {
    let default = if verbose { "mapweave=debug" } else { "mapweave=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// What `resolve` and `check` were asked to do
struct Request<'a> {
    metadata: &'a Path,
    only: Option<&'a str>,
    output: Option<&'a Path>,
    format: OutputFormat,
    show_plans: bool,
}

fn resolve(settings: &Settings, request: Request<'_>) -> anyhow::Result<ExitCode> {
    let start = Instant::now();
    let catalog = TypeCatalog::load(request.metadata)?;

    let only = match request.only {
        Some(name) => Some(
            catalog
                .resolve(name)
                .map(|ty| ty.name.clone())
                .ok_or_else(|| MapError::TypeNotFound {
                    name: name.to_string(),
                })?,
        ),
        None => None,
    };

    let engine = MappingEngine::new(&catalog, settings);
    let mut report = engine.run()?;
    if let Some(name) = &only {
        report.retain_type(name);
    }
    if let Some(output) = request.output {
        report.save_plans(output)?;
    }
    let code = ExitCode::from_report(&report);

    match request.format {
        OutputFormat::Json => {
            let meta = ResponseMeta::now(Some(start.elapsed().as_millis() as u64));
            let json = if request.show_plans {
                to_json(&report, meta)?
            } else {
                let data = CheckData {
                    errors: report.error_count(),
                    warnings: report.warning_count(),
                    diagnostics: report.all_diagnostics().collect(),
                };
                to_json_with(&report, data, meta)?
            };
            println!("{json}");
        }
        OutputFormat::Text => println!("{}", render_report(&report, request.show_plans)),
    }

    Ok(code)
}

fn to_json(report: &RunReport, meta: ResponseMeta) -> Result<String, MapError> {
    to_json_with(report, report, meta)
}

fn to_json_with<T: Serialize>(report: &RunReport, data: T, meta: ResponseMeta) -> Result<String, MapError> {
    let response = if report.has_errors() {
        JsonResponse::with_resolution_errors(data, report.error_count())
    } else {
        JsonResponse::success(data)
    };
    Ok(serde_json::to_string_pretty(&response.with_meta(meta))?)
}

fn report_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let Some(map_error) = error.downcast_ref::<MapError>() else {
        eprintln!("{}", THEME.error_with_icon(&format!("{error:#}")));
        return ExitCode::GeneralError;
    };

    if format.is_json() {
        let response = JsonResponse::from_error(map_error);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    } else {
        eprintln!("{}", THEME.error_with_icon(&map_error.to_string()));
        for suggestion in map_error.recovery_suggestions() {
            eprintln!("  {} {suggestion}", THEME.apply(&THEME.dim, "hint:"));
        }
    }
    ExitCode::from_error(map_error)
}
