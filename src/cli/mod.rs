//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod bench;
pub mod common;
pub mod play;
pub mod sweep;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use arcanum::config::MemoryStrategy;

#[derive(Parser)]
#[command(name = "arcanum")]
#[command(version)]
#[command(about = "Text-adventure narrator and context-memory benchmark", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the adventure interactively
    Play {
        /// Model to narrate with (defaults to provider.default_model)
        #[arg(long)]
        model: Option<String>,
        /// Memory strategy: sliding or rolling
        #[arg(long)]
        strategy: Option<MemoryStrategy>,
        /// Memory window size
        #[arg(long)]
        window_size: Option<usize>,
        /// Use temperature 0 sampling
        #[arg(long)]
        deterministic: bool,
    },
    /// Run scenarios against several providers concurrently
    Bench {
        /// Scenario files or directories of .yaml/.yml scenarios
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Comma-separated OpenRouter model ids
        #[arg(long, required = true, value_delimiter = ',')]
        providers: Vec<String>,
        /// Concurrent jobs
        #[arg(long)]
        workers: Option<usize>,
        /// Memory window size
        #[arg(long)]
        window_size: Option<usize>,
        /// Memory strategy: sliding or rolling
        #[arg(long)]
        strategy: Option<MemoryStrategy>,
        /// Directory for run logs and error logs
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Sample with temperature 0.7 instead of 0
        #[arg(long)]
        no_deterministic: bool,
    },
    /// Find the smallest memory window that keeps full recall
    Sweep {
        /// Scenario file
        scenario: PathBuf,
        /// Comma-separated OpenRouter model ids
        #[arg(long, required = true, value_delimiter = ',')]
        providers: Vec<String>,
        /// Smallest window to probe
        #[arg(long)]
        min_window: Option<usize>,
        /// Largest window to probe (verified first)
        #[arg(long)]
        max_window: Option<usize>,
        /// Probe every window instead of stopping at the first failure
        #[arg(long)]
        exhaustive: bool,
        /// Memory strategy: sliding or rolling
        #[arg(long)]
        strategy: Option<MemoryStrategy>,
        /// Providers swept concurrently
        #[arg(long)]
        workers: Option<usize>,
        /// Directory for run logs and error logs
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

/// Main entry point for the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Play {
            model,
            strategy,
            window_size,
            deterministic,
        }) => {
            let config = common::load_config()?;
            play::cmd_play(config, model, strategy, window_size, deterministic).await?;
        }
        Some(Commands::Bench {
            paths,
            providers,
            workers,
            window_size,
            strategy,
            log_dir,
            no_deterministic,
        }) => {
            let config = common::load_config()?;
            bench::cmd_bench(
                config,
                bench::BenchArgs {
                    paths,
                    providers,
                    workers,
                    window_size,
                    strategy,
                    log_dir,
                    no_deterministic,
                },
            )
            .await?;
        }
        Some(Commands::Sweep {
            scenario,
            providers,
            min_window,
            max_window,
            exhaustive,
            strategy,
            workers,
            log_dir,
        }) => {
            let config = common::load_config()?;
            sweep::cmd_sweep(
                config,
                sweep::SweepArgs {
                    scenario,
                    providers,
                    min_window,
                    max_window,
                    exhaustive,
                    strategy,
                    workers,
                    log_dir,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("arcanum {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Text-adventure narrator and context-memory benchmark");
}
