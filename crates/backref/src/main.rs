//! Backref command-line interface
//!
//! - `backref scan`: find every prefab, data asset and scene component that
//!   references the given targets
//! - `backref config`: print the effective configuration

use anyhow::{Context, Result};
use backref::{run_scan, ScanRequest};
use backref_logging::{init_logging, logs_dir, LogConfig, LogGuard};
use backref_scan::{CancelToken, ScanConfig, ScanEvent};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.toml";

/// Exit code for a scan stopped by Ctrl+C
const EXIT_CANCELLED: u8 = 130;

/// Progress bar resolution
const PROGRESS_STEPS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "backref", version, about = "Find what references an asset")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.backref/config.toml if present)
    #[arg(long, global = true, env = "BACKREF_CONFIG")]
    config: Option<PathBuf>,

    /// Do not write a log file under ~/.backref/logs
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find references to one or more assets
    Scan {
        /// Asset paths, or SCENE#FILE_ID for an object in an opened scene
        #[arg(required = true)]
        targets: Vec<String>,

        /// Project directory walked for assets
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Scene to open; its components are probed as live objects
        #[arg(short, long = "scene")]
        scenes: Vec<PathBuf>,

        /// Asset file suffix to scan (repeatable, replaces the configured list)
        #[arg(short, long = "ext")]
        extensions: Vec<String>,

        /// Work allowed per tick in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// No progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = setup_logging(&cli);

    match run_command(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(1)
        }
    }
}

fn setup_logging(cli: &Cli) -> Option<LogGuard> {
    let log_dir = if cli.no_log_file { None } else { logs_dir() };
    let config = LogConfig {
        app_name: "backref",
        verbose: cli.verbose,
        log_dir,
    };
    match init_logging(config.clone()) {
        Ok(guard) => Some(guard),
        Err(err) if config.log_dir.is_some() => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            init_logging(LogConfig {
                log_dir: None,
                ..config
            })
            .ok()
        }
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    }
}

fn run_command(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Config { json } => {
            print_config(&config, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Scan {
            targets,
            root,
            scenes,
            extensions,
            budget_ms,
            json,
            quiet,
        } => {
            let mut config = config;
            if let Some(root) = root {
                config.root_dir = root;
            }
            if !extensions.is_empty() {
                config.extensions = extensions.into_iter().map(normalize_extension).collect();
            }
            if let Some(budget_ms) = budget_ms {
                config.frame_budget_ms = budget_ms;
            }

            let request = ScanRequest {
                config,
                scenes,
                targets,
            };
            run_scan_command(&request, json, quiet)
        }
    }
}

/// Defaults, then the config file
fn load_config(explicit: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = explicit {
        return ScanConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }

    match backref_logging::backref_home().map(|home| home.join(CONFIG_FILE)) {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "Loading user config");
            ScanConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        _ => Ok(ScanConfig::default()),
    }
}

/// `prefab` and `.prefab` both mean the `.prefab` suffix
fn normalize_extension(ext: String) -> String {
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn print_config(config: &ScanConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn run_scan_command(request: &ScanRequest, json: bool, quiet: bool) -> Result<ExitCode> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, cancelling scan...");
        handler_token.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    let progress = if json || quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::with_draw_target(Some(PROGRESS_STEPS), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {msg:<28} [{bar:40.cyan/blue}] {percent:>3}% [{elapsed_precise}]",
            )
            .context("Invalid progress template")?
            .progress_chars("=> "),
        );
        bar
    };

    let bar = progress.clone();
    let listener: Box<dyn FnMut(&ScanEvent)> = Box::new(move |event: &ScanEvent| match event {
        ScanEvent::Progress {
            phase, fraction, ..
        } => {
            bar.set_message(phase.description());
            bar.set_position((*fraction as f64 * PROGRESS_STEPS as f64) as u64);
        }
        ScanEvent::Completed { .. } => bar.set_position(PROGRESS_STEPS),
    });

    let report = run_scan(request, &cancel, Some(listener));
    progress.finish_and_clear();
    let report = report.context("Scan failed")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        report.print();
    }

    if report.cancelled {
        Ok(ExitCode::from(EXIT_CANCELLED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
