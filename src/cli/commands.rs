use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::directive::Method;
use crate::generator::generate;
use crate::manifest::find_manifest;
use crate::runner::{self, Shutdown};
use crate::scanner::{scan, ScanDiagnostic, ScanPolicy, ScanReport};
use crate::staging::{self, StagedTree};

/// Command-line interface for doroute
///
/// Discovers `do:api` handlers in a package and turns them into an axum
/// server program.
#[derive(Parser)]
#[command(name = "doroute", version)]
#[command(about = "Generate an HTTP server from do:api directives", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a package and print the routes it declares
    Inspect {
        /// Directory to scan (any directory inside the package)
        #[arg(short, long, env = "DOROUTE_ROOT", default_value = ".")]
        root: PathBuf,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail on malformed directives instead of skipping them
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Copy the package into an output directory and generate the server there
    Generate {
        /// Directory to scan (any directory inside the package)
        #[arg(short, long, env = "DOROUTE_ROOT", default_value = ".")]
        root: PathBuf,

        /// Directory receiving the package copy and generated program
        #[arg(short, long)]
        output: PathBuf,

        /// Port the generated server listens on (default: DOROUTE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Binary target name (default: DOROUTE_BIN_NAME or doroute-server)
        #[arg(long)]
        bin_name: Option<String>,

        /// Fail on malformed directives instead of skipping them
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Generate into a temp directory and run the server until interrupted
    Serve {
        /// Directory to scan (any directory inside the package)
        #[arg(short, long, env = "DOROUTE_ROOT", default_value = ".")]
        root: PathBuf,

        /// Port the generated server listens on (default: DOROUTE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Fail on malformed directives instead of skipping them
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

/// `inspect --json` output.
#[derive(Serialize)]
struct InspectOutput<'a> {
    crate_name: String,
    manifest: &'a Path,
    files_scanned: usize,
    routes: Vec<RouteRow>,
    diagnostics: &'a [ScanDiagnostic],
    unreachable: &'a [PathBuf],
}

#[derive(Serialize)]
struct RouteRow {
    method: Method,
    path: String,
    handler: String,
}

fn route_rows(report: &ScanReport) -> Vec<RouteRow> {
    report
        .routes
        .iter()
        .map(|r| RouteRow {
            method: r.method(),
            path: r.effective_path(),
            handler: r.handler_path(),
        })
        .collect()
}

pub(super) fn policy(strict: bool) -> ScanPolicy {
    if strict {
        ScanPolicy::Strict
    } else {
        ScanPolicy::Lenient
    }
}

pub(super) fn generator_config(port: Option<u16>, bin_name: Option<&str>) -> GeneratorConfig {
    let mut config = GeneratorConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(name) = bin_name {
        config.bin_name = name.to_string();
    }
    config
}

/// Stage the package governing `root` and return the copy plus `root`'s place in it.
fn stage(root: &Path, dest: Option<&Path>) -> Result<(StagedTree, PathBuf)> {
    let manifest = find_manifest(root).context("Failed to locate Cargo.toml")?;
    let package_dir = manifest.dir().to_path_buf();
    let abs_root = fs::canonicalize(root)
        .with_context(|| format!("Invalid root directory {}", root.display()))?;
    let rel = abs_root.strip_prefix(&package_dir).unwrap_or(Path::new(""));

    let staged = match dest {
        Some(dest) => staging::stage_tree_into(&package_dir, dest),
        None => staging::stage_tree(&package_dir),
    }
    .context("Failed to stage package")?;
    info!(
        package = %package_dir.display(),
        staged = %staged.path().display(),
        files = staged.files(),
        "staged package"
    );

    let staged_root = staged.path().join(rel);
    Ok((staged, staged_root))
}

fn print_table(report: &ScanReport) {
    let rows = route_rows(report);
    if rows.is_empty() {
        println!("No routes found ({} files scanned)", report.files_scanned);
    } else {
        let width = rows
            .iter()
            .map(|r| r.path.len())
            .max()
            .unwrap_or(0)
            .max("PATH".len());
        println!("{:<7} {:<width$} HANDLER", "METHOD", "PATH");
        for row in &rows {
            println!("{:<7} {:<width$} {}", row.method.as_str(), row.path, row.handler);
        }
    }
    for diag in &report.diagnostics {
        println!(
            "skipped {}:{} `{}`: {}",
            diag.file.display(),
            diag.line,
            diag.function,
            diag.error
        );
    }
    for file in &report.unreachable {
        println!("not a public module: {}", file.display());
    }
}

fn inspect(root: &Path, json: bool, strict: bool) -> Result<()> {
    let manifest = find_manifest(root).context("Failed to locate Cargo.toml")?;
    let report = scan(root, &manifest, policy(strict)).context("Failed to scan sources")?;

    if json {
        let output = InspectOutput {
            crate_name: manifest.module_path(),
            manifest: manifest.path(),
            files_scanned: report.files_scanned,
            routes: route_rows(&report),
            diagnostics: &report.diagnostics,
            unreachable: &report.unreachable,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(&report);
    }
    Ok(())
}

fn generate_into(root: &Path, output: &Path, config: &GeneratorConfig, strict: bool) -> Result<()> {
    let (staged, staged_root) = stage(root, Some(output))?;
    let report = generate(&staged_root, staged.path(), config, policy(strict))
        .context("Failed to generate server program")?;

    println!(
        "Generated {} with {} route(s)",
        report.program_path.display(),
        report.routes.len()
    );
    println!(
        "Run it with: cd {} && cargo run --bin {}",
        staged.path().display(),
        config.bin_name
    );
    Ok(())
}

fn serve_staged(
    staged: &StagedTree,
    staged_root: &Path,
    config: &GeneratorConfig,
    strict: bool,
) -> Result<()> {
    let report = generate(staged_root, staged.path(), config, policy(strict))
        .context("Failed to generate server program")?;

    info!(
        routes = report.routes.len(),
        url = %format!("http://localhost:{}", config.port),
        "starting server"
    );
    let mut child = runner::spawn_server(staged.path(), &config.bin_name)
        .context("Failed to start generated program")?;
    let shutdown = runner::wait_for_shutdown(&mut child);
    runner::stop(&mut child).context("Failed to stop generated program")?;

    match shutdown.context("Failed while waiting for the server")? {
        Shutdown::Signal(_) => Ok(()),
        Shutdown::Exited(status) if status.success() => Ok(()),
        Shutdown::Exited(status) => bail!("generated program exited with {status}"),
    }
}

fn serve(root: &Path, config: &GeneratorConfig, strict: bool) -> Result<()> {
    let (staged, staged_root) = stage(root, None)?;
    let result = serve_staged(&staged, &staged_root, config, strict);
    if let Err(e) = staged.cleanup() {
        warn!(error = %e, "failed to remove staging directory");
    }
    result
}

/// Execute a parsed command line
///
/// # Errors
///
/// Returns an error naming the failing stage if:
/// - No `Cargo.toml` governs the root directory
/// - A source file fails to parse, or a directive is malformed under `--strict`
/// - Routes conflict or a generated artifact cannot be written
/// - The generated program cannot be started
pub fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Inspect { root, json, strict } => inspect(root, *json, *strict),
        Commands::Generate {
            root,
            output,
            port,
            bin_name,
            strict,
        } => {
            let config = generator_config(*port, bin_name.as_deref());
            generate_into(root, output, &config, *strict)
        }
        Commands::Serve { root, port, strict } => {
            let config = generator_config(*port, None);
            serve(root, &config, *strict)
        }
    }
}

/// Parse the process arguments and execute them.
pub fn run_cli() -> Result<()> {
    execute(Cli::parse())
}
