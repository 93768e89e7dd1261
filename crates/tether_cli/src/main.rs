//! tether-sim
//!
//! Replay scripted drag gestures against the headless backend and report
//! what the overlay drew.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tether::TetherConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod replay;
mod script;

use replay::{Replay, Report};
use script::Script;

#[derive(Parser)]
#[command(name = "tether-sim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replay drag gestures against the headless tether backend", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log filter, overrides RUST_LOG and --verbose
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a gesture script
    Run {
        /// Script file
        script: PathBuf,

        /// Element configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Animation frame rate
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Use solid placeholder frames instead of the frame directory
        #[arg(long)]
        synthetic_frames: bool,
    },

    /// Validate a configuration file
    Check {
        /// Element configuration file
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON reports stay parseable
    let filter = match &cli.log {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if cli.verbose { "debug" } else { "info" })
        }),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            script,
            config,
            fps,
            json,
            synthetic_frames,
        } => cmd_run(&script, config.as_deref(), fps, json, synthetic_frames),
        Commands::Check { config } => cmd_check(&config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<TetherConfig> {
    match path {
        Some(path) => TetherConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(TetherConfig::default()),
    }
}

fn cmd_run(
    script_path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    fps: u32,
    json: bool,
    synthetic_frames: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let script = Script::load(script_path)?;
    info!(
        "Replaying {} ({} elements, {} steps)",
        script_path.display(),
        script.elements.len(),
        script.steps.len()
    );

    let loader = replay::frame_loader(&config, synthetic_frames);
    let report = Replay::new(&config, &script, loader, fps)?.run(&script)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_check(path: &std::path::Path) -> Result<()> {
    let config = load_config(Some(path))?;
    info!(
        "{} is valid: {} presets, {} default frames",
        path.display(),
        config.presets.len(),
        config.defaults.disappear.frames.len()
    );
    for preset in &config.presets {
        let marks = match (&preset.config.mark, &preset.config.leader_mark) {
            (Some(mark), Some(leader)) => format!("mark={} leader={}", mark, leader),
            (Some(mark), None) => format!("mark={}", mark),
            (None, Some(leader)) => format!("leader={}", leader),
            (None, None) => String::new(),
        };
        println!("  {:<16} {}", preset.name, marks);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "{:>4}  {:<10} {:<12} {:<8} {:<14} {:>6} {:>6} {:>8}",
        "#", "action", "element", "accepted", "state", "frames", "images", "clock"
    );
    for step in &report.steps {
        println!(
            "{:>4}  {:<10} {:<12} {:<8} {:<14} {:>6} {:>6} {:>6}ms",
            step.index,
            step.action,
            step.element.as_deref().unwrap_or("-"),
            if step.accepted { "yes" } else { "no" },
            step.state.as_deref().unwrap_or("-"),
            step.frames_posted,
            step.images_drawn,
            step.clock_ms
        );
    }

    println!();
    for element in &report.elements {
        println!(
            "{:<12} {:<14} visible={:<5} drag_complete={} disappear_complete={}",
            element.name,
            element.state,
            element.content_visible,
            element.drag_completes,
            element.disappear_completes
        );
    }
    println!();
    println!(
        "{} frames posted, {} frame decodes",
        report.total_frames, report.frame_decodes
    );
}
