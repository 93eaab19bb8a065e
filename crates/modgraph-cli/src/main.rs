//! modgraph CLI.
//!
//! Commands:
//! - `modgraph resolve <root>...` - Resolve root modules and check the graph
//! - `modgraph check` - Load every descriptor on the module path
//! - `modgraph describe <module>` - Print a module's descriptor
//!
//! Exit status is 0 when no errors were reported, 1 when the module graph has
//! errors and 2 when the command itself could not run.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use modgraph_cli::config::LOG_ENV;
use modgraph_cli::{load_module_path, write_report, CliConfig, CliError, CliResult, OutputFormat};
use modgraph_common::DiagnosticEmitter;
use modgraph_module::{resolve_and_validate, ResolveRequest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modgraph")]
#[command(about = "Static module graph resolver", long_about = None)]
struct Cli {
    /// Log more; repeat for more detail. MODGRAPH_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModulePathArgs {
    /// Descriptor file or directory; may be repeated. Defaults to MODGRAPH_MODULE_PATH
    #[arg(short = 'p', long = "module-path", value_name = "PATH")]
    module_path: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve root modules and validate the resulting graph
    Resolve {
        /// Root modules
        roots: Vec<String>,

        #[command(flatten)]
        path: ModulePathArgs,

        /// Additional root modules, comma separated
        #[arg(long, value_delimiter = ',', value_name = "MODULES")]
        add_modules: Vec<String>,

        /// Module every explicit module reads implicitly
        #[arg(long, value_name = "MODULE", conflicts_with = "no_base_module")]
        base_module: Option<String>,

        /// Do not seed a base module
        #[arg(long)]
        no_base_module: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Load every descriptor on the module path and report problems
    Check {
        #[command(flatten)]
        path: ModulePathArgs,
    },

    /// Print a module's descriptor
    Describe {
        /// Module name
        module: String,

        #[command(flatten)]
        path: ModulePathArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Runs a command. `Ok(false)` means errors were reported.
fn run(command: Commands) -> CliResult<bool> {
    let config = CliConfig::from_env();
    match command {
        Commands::Resolve {
            roots,
            path,
            add_modules,
            base_module,
            no_base_module,
            format,
        } => {
            let config = config
                .with_module_path(path.module_path)
                .with_base_module(base_module, no_base_module);
            cmd_resolve(&config, roots, add_modules, format)
        }
        Commands::Check { path } => cmd_check(&config.with_module_path(path.module_path)),
        Commands::Describe { module, path } => {
            cmd_describe(&config.with_module_path(path.module_path), &module)
        }
    }
}

fn cmd_resolve(
    config: &CliConfig,
    roots: Vec<String>,
    add_modules: Vec<String>,
    format: OutputFormat,
) -> CliResult<bool> {
    debug!(?config, "resolve");
    let loaded = load_module_path(&config.module_path)?;

    let request = ResolveRequest::new(roots)
        .with_extra_roots(add_modules)
        .with_base_module(config.base_module.clone());
    let mut report =
        resolve_and_validate(&loaded.catalog, &request).merge_diagnostics(loaded.diagnostics.clone());
    loaded.locate(&mut report.diagnostics);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &report, &loaded, format)?;
    out.flush()?;
    Ok(report.success)
}

fn cmd_check(config: &CliConfig) -> CliResult<bool> {
    debug!(?config, "check");
    let loaded = load_module_path(&config.module_path)?;
    DiagnosticEmitter::new(&loaded.source_map).emit_all(&loaded.diagnostics);

    println!(
        "checked {} file(s): {} module(s), {} error(s), {} warning(s)",
        loaded.source_map.file_count(),
        loaded.catalog.len(),
        loaded.diagnostics.error_count(),
        loaded.diagnostics.warning_count()
    );
    Ok(!loaded.diagnostics.has_errors())
}

fn cmd_describe(config: &CliConfig, module: &str) -> CliResult<bool> {
    debug!(?config, module, "describe");
    let loaded = load_module_path(&config.module_path)?;
    let descriptor = loaded
        .catalog
        .get(module)
        .ok_or_else(|| CliError::ModuleNotFound(module.to_string()))?;

    if let Some(file) = loaded.origin(module).and_then(|loc| loaded.source_map.file_name(loc.file)) {
        println!("// {}", file);
    }
    print!("{}", descriptor);
    Ok(true)
}
