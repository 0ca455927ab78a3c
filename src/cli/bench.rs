//! Head-to-head benchmark command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use arcanum::bench::{
    resolve_scenario_paths, BenchmarkExecutor, OpenRouterAgentFactory, ScenarioRunner,
};
use arcanum::config::{Config, MemoryStrategy};

use super::common::{apply_memory_overrides, clean_providers};

pub(crate) struct BenchArgs {
    pub paths: Vec<PathBuf>,
    pub providers: Vec<String>,
    pub workers: Option<usize>,
    pub window_size: Option<usize>,
    pub strategy: Option<MemoryStrategy>,
    pub log_dir: Option<PathBuf>,
    pub no_deterministic: bool,
}

pub(crate) async fn cmd_bench(mut config: Config, args: BenchArgs) -> Result<()> {
    apply_memory_overrides(&mut config, args.strategy, args.window_size);
    if let Some(workers) = args.workers {
        config.bench.max_workers = workers;
    }
    if let Some(dir) = args.log_dir {
        config.bench.log_dir = dir.to_string_lossy().into_owned();
    }
    if args.no_deterministic {
        config.bench.deterministic = false;
    }
    config.validate()?;

    let providers = clean_providers(args.providers);
    if providers.is_empty() {
        bail!("--providers must name at least one model");
    }

    // Fatal before anything is scheduled.
    let factory = OpenRouterAgentFactory::from_config(&config)?;

    let scenarios = resolve_scenario_paths(&args.paths)
        .with_context(|| "Failed to resolve scenario paths")?;
    if scenarios.is_empty() {
        bail!("no scenario files found");
    }

    let executor = BenchmarkExecutor::new(
        Arc::new(factory),
        ScenarioRunner::new(&config.bench.log_dir),
        config.bench.max_workers,
    );

    println!(
        "Running {} jobs with {} workers...",
        scenarios.len() * providers.len(),
        executor.max_workers()
    );

    let report = executor
        .run_matrix(
            &scenarios,
            &providers,
            config.memory.effective_window(),
            config.memory.strategy,
        )
        .await;

    println!();
    print!("{}", report.render());

    if !report.all_succeeded() {
        bail!(
            "{} of {} jobs failed",
            report.failures.len(),
            report.failures.len() + report.results.len()
        );
    }
    Ok(())
}
