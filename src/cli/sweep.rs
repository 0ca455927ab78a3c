//! Window-size sweep command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use arcanum::bench::{
    render_summary, BenchmarkExecutor, ExecutorProbe, OpenRouterAgentFactory, ScenarioRunner,
    WindowSweep,
};
use arcanum::config::{Config, MemoryStrategy, ProbeStrategy};

use super::common::clean_providers;

pub(crate) struct SweepArgs {
    pub scenario: PathBuf,
    pub providers: Vec<String>,
    pub min_window: Option<usize>,
    pub max_window: Option<usize>,
    pub exhaustive: bool,
    pub strategy: Option<MemoryStrategy>,
    pub workers: Option<usize>,
    pub log_dir: Option<PathBuf>,
}

pub(crate) async fn cmd_sweep(mut config: Config, args: SweepArgs) -> Result<()> {
    if let Some(min) = args.min_window {
        config.sweep.min_window = min;
    }
    if let Some(max) = args.max_window {
        config.sweep.max_window = max;
    }
    if args.exhaustive {
        config.sweep.probe = ProbeStrategy::Exhaustive;
    }
    if let Some(strategy) = args.strategy {
        config.memory.strategy = strategy;
    }
    if let Some(workers) = args.workers {
        config.bench.max_workers = workers;
    }
    if let Some(dir) = args.log_dir {
        config.bench.log_dir = dir.to_string_lossy().into_owned();
    }
    config.validate()?;

    let providers = clean_providers(args.providers);
    if providers.is_empty() {
        bail!("--providers must name at least one model");
    }

    let factory = OpenRouterAgentFactory::from_config(&config)?;
    if !args.scenario.is_file() {
        bail!("scenario file not found: {}", args.scenario.display());
    }

    let executor = BenchmarkExecutor::new(
        Arc::new(factory),
        ScenarioRunner::new(&config.bench.log_dir),
        config.bench.max_workers,
    );
    let probe = ExecutorProbe::new(executor, args.scenario.clone(), config.memory.strategy);
    let sweep = WindowSweep::new(
        Arc::new(probe),
        config.sweep.min_window,
        config.sweep.max_window,
        config.sweep.probe,
    )?;

    println!(
        "Sweeping window sizes {}..={} for scenario {} ({})",
        config.sweep.min_window,
        config.sweep.max_window,
        args.scenario.display(),
        config.sweep.probe
    );

    let results = sweep.sweep_all(&providers, config.bench.max_workers).await;

    println!();
    print!("{}", render_summary(&results));
    Ok(())
}
