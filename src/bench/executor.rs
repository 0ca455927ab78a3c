//! Concurrent benchmark executor.
//!
//! Every (scenario, provider) pair is an independent job with its own agent
//! and memory. Jobs run on tokio tasks bounded by a semaphore and are collected
//! in completion order. A failing or panicking job is written to an error log
//! and reported without disturbing its siblings.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{error, warn};

use crate::agent::{Agent, STATIC_PRIMER};
use crate::config::{Config, MemoryStrategy};
use crate::error::{ArcanumError, Result};
use crate::log_component;
use crate::memory::create_memory;
use crate::providers::{LLMProvider, OpenRouterProvider, RetryProvider};

use super::runner::ScenarioRunner;
use super::scenario::{scenario_id, Scenario};

// ============================================================================
// Jobs
// ============================================================================

/// One unit of benchmark work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    /// Scenario file
    pub scenario_path: PathBuf,
    /// Model identifier, e.g. `openai/gpt-4o`
    pub provider_id: String,
    /// Memory window (raw window for rolling summary)
    pub window_size: usize,
    /// Memory strategy
    pub strategy: MemoryStrategy,
}

impl JobSpec {
    pub fn new(
        scenario_path: impl Into<PathBuf>,
        provider_id: &str,
        window_size: usize,
        strategy: MemoryStrategy,
    ) -> Self {
        Self {
            scenario_path: scenario_path.into(),
            provider_id: provider_id.to_string(),
            window_size,
            strategy,
        }
    }

    /// Scenario identifier (file stem).
    pub fn scenario_id(&self) -> String {
        scenario_id(&self.scenario_path)
    }

    /// `<scenario>@<provider>`
    pub fn id(&self) -> String {
        format!("{}@{}", self.scenario_id(), self.provider_id)
    }
}

/// Cartesian product of scenarios and providers, scenario-major.
pub fn build_matrix(
    scenarios: &[PathBuf],
    providers: &[String],
    window_size: usize,
    strategy: MemoryStrategy,
) -> Vec<JobSpec> {
    scenarios
        .iter()
        .flat_map(|scenario| {
            providers
                .iter()
                .map(move |provider| JobSpec::new(scenario.clone(), provider, window_size, strategy))
        })
        .collect()
}

/// A finished job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job: JobSpec,
    /// passes / total
    pub recall: f64,
    pub passes: usize,
    pub total: usize,
    /// Run log
    pub log_path: PathBuf,
    /// Wall-clock seconds for the whole job
    pub elapsed: f64,
}

/// A job that returned an error or panicked.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub job: JobSpec,
    /// One-line error
    pub error: String,
    /// Diagnostic file, if it could be written
    pub error_log: Option<PathBuf>,
}

/// Everything a benchmark run produced.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    /// Successful jobs, in completion order
    pub results: Vec<JobResult>,
    /// Failed jobs, in completion order
    pub failures: Vec<JobFailure>,
}

impl BenchmarkReport {
    /// True if no job failed.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary table, sorted by scenario then provider.
    pub fn render(&self) -> String {
        let mut results: Vec<&JobResult> = self.results.iter().collect();
        results.sort_by(|a, b| {
            (a.job.scenario_id(), &a.job.provider_id).cmp(&(b.job.scenario_id(), &b.job.provider_id))
        });

        let mut out = String::from("Summary:\n");
        for r in results {
            out.push_str(&format!(
                "{:<20} {:<30} recall={:.2} ({}/{}) log={}\n",
                r.job.scenario_id(),
                r.job.provider_id,
                r.recall,
                r.passes,
                r.total,
                r.log_path.display()
            ));
        }

        if !self.failures.is_empty() {
            out.push_str("\nFailures:\n");
            for f in &self.failures {
                let log = f
                    .error_log
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!("{:<51} {} log={}\n", f.job.id(), f.error, log));
            }
        }
        out
    }
}

// ============================================================================
// Agent Factory
// ============================================================================

/// Builds a fresh agent for each job.
pub trait AgentFactory: Send + Sync {
    fn build(&self, job: &JobSpec) -> Result<Agent>;
}

/// Production factory: one retrying OpenRouter provider and one memory per job.
///
/// The HTTP client (connection pool) is shared; nothing mutable is.
#[derive(Debug, Clone)]
pub struct OpenRouterAgentFactory {
    api_key: String,
    api_base: String,
    client: Client,
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    deterministic: bool,
    primer: String,
}

impl OpenRouterAgentFactory {
    /// Build from config. Fails if the API key is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let mut builder = Client::builder();
        if let Some(secs) = config.provider.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            api_key,
            api_base: config.provider.api_base.clone(),
            client: builder.build()?,
            max_retries: config.provider.max_retries,
            base_delay_ms: config.provider.base_delay_ms,
            max_delay_ms: config.provider.max_delay_ms,
            deterministic: config.bench.deterministic,
            primer: STATIC_PRIMER.to_string(),
        })
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub fn with_primer(mut self, primer: &str) -> Self {
        self.primer = primer.to_string();
        self
    }

    /// A retrying provider for `model`.
    pub fn provider_for(&self, model: &str) -> Arc<dyn LLMProvider> {
        let inner = OpenRouterProvider::with_client(
            &self.api_key,
            &self.api_base,
            model,
            self.client.clone(),
        );
        Arc::new(
            RetryProvider::new(Box::new(inner))
                .with_max_retries(self.max_retries)
                .with_base_delay_ms(self.base_delay_ms)
                .with_max_delay_ms(self.max_delay_ms),
        )
    }

    /// A fresh agent outside any benchmark job (interactive play).
    pub fn agent_for(
        &self,
        model: &str,
        strategy: MemoryStrategy,
        window_size: usize,
    ) -> Result<Agent> {
        let provider = self.provider_for(model);
        let memory = create_memory(strategy, window_size, Arc::clone(&provider))?;
        Ok(Agent::new(provider, memory, &self.primer).with_deterministic(self.deterministic))
    }
}

impl AgentFactory for OpenRouterAgentFactory {
    fn build(&self, job: &JobSpec) -> Result<Agent> {
        self.agent_for(&job.provider_id, job.strategy, job.window_size)
    }
}

// ============================================================================
// Executor
// ============================================================================

enum JobError {
    Failed(ArcanumError),
    Panicked(String),
}

impl JobError {
    fn summary(&self) -> String {
        match self {
            JobError::Failed(e) => e.to_string(),
            JobError::Panicked(msg) => format!("job panicked: {}", msg),
        }
    }

    fn diagnostic(&self) -> String {
        match self {
            JobError::Failed(e) => e.diagnostic_chain(),
            JobError::Panicked(msg) => format!("panic: {}", msg),
        }
    }
    fn into_error(self) -> ArcanumError {
        match self {
            JobError::Failed(e) => e,
            JobError::Panicked(msg) => ArcanumError::Job(format!("job panicked: {}", msg)),
        }
    }
}

type JobOutcome = std::result::Result<JobResult, JobError>;

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Error-log body: job identity, time, then the full error chain.
fn render_error_log(job: &JobSpec, diagnostic: &str) -> String {
    format!(
        "job: {}\nscenario: {}\nprovider: {}\nwindow_size: {}\nstrategy: {}\ntimestamp: {}\n\n{}\n",
        job.id(),
        job.scenario_path.display(),
        job.provider_id,
        job.window_size,
        job.strategy,
        Utc::now().to_rfc3339(),
        diagnostic
    )
}

/// Runs benchmark jobs on a bounded pool of tokio tasks.
#[derive(Clone)]
pub struct BenchmarkExecutor {
    factory: Arc<dyn AgentFactory>,
    runner: ScenarioRunner,
    max_workers: usize,
}

impl std::fmt::Debug for BenchmarkExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkExecutor")
            .field("runner", &self.runner)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

impl BenchmarkExecutor {
    /// Create an executor. A worker count of zero is raised to one.
    pub fn new(factory: Arc<dyn AgentFactory>, runner: ScenarioRunner, max_workers: usize) -> Self {
        Self {
            factory,
            runner,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    /// Run one job on the current task.
    ///
    /// A panic inside the job unwinds into the caller; use
    /// [`run_job_isolated`](Self::run_job_isolated) to turn it into an error.
    pub async fn run_job(&self, job: &JobSpec) -> Result<JobResult> {
        let scenario = Scenario::load(&job.scenario_path)?;
        let mut agent = self.factory.build(job)?;
        let id = job.id();

        log_component!(
            info,
            "executor",
            "Job started",
            job = id.as_str(),
            steps = scenario.len(),
            window_size = job.window_size
        );

        let started = Instant::now();
        let outcome = self
            .runner
            .run(&scenario, &mut agent, &job.provider_id)
            .await?;
        let elapsed = started.elapsed().as_secs_f64();

        Ok(JobResult {
            job: job.clone(),
            recall: outcome.recall,
            passes: outcome.passes(),
            total: outcome.steps.len(),
            log_path: outcome.log_path,
            elapsed,
        })
    }

    /// Run one job on the current task, reporting a panic as [`ArcanumError::Job`].
    pub async fn run_job_isolated(&self, job: &JobSpec) -> Result<JobResult> {
        self.run_guarded(job).await.map_err(JobError::into_error)
    }

    async fn run_guarded(&self, job: &JobSpec) -> JobOutcome {
        match AssertUnwindSafe(self.run_job(job)).catch_unwind().await {
            Ok(result) => result.map_err(JobError::Failed),
            Err(payload) => Err(JobError::Panicked(panic_message(payload))),
        }
    }

    /// Run the Cartesian product of `scenarios` and `providers`.
    pub async fn run_matrix(
        &self,
        scenarios: &[PathBuf],
        providers: &[String],
        window_size: usize,
        strategy: MemoryStrategy,
    ) -> BenchmarkReport {
        self.run(build_matrix(scenarios, providers, window_size, strategy))
            .await
    }

    /// Run all jobs, at most `max_workers` at a time.
    pub async fn run(&self, jobs: Vec<JobSpec>) -> BenchmarkReport {
        log_component!(
            info,
            "executor",
            "Running jobs",
            jobs = jobs.len(),
            workers = self.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();
        let mut pending: HashMap<task::Id, JobSpec> = HashMap::with_capacity(jobs.len());

        for job in jobs {
            let executor = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let spec = job.clone();
            let handle = set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => executor.run_guarded(&job).await,
                    Err(_) => Err(JobError::Failed(ArcanumError::Job(
                        "worker pool closed".to_string(),
                    ))),
                };
                (job, outcome)
            });
            pending.insert(handle.id(), spec);
        }

        self.collect(set, pending).await
    }

    /// Drain `set` in completion order. Jobs whose task never reports back
    /// are looked up in `pending` and recorded as failures.
    async fn collect(
        &self,
        mut set: JoinSet<(JobSpec, JobOutcome)>,
        mut pending: HashMap<task::Id, JobSpec>,
    ) -> BenchmarkReport {
        let mut report = BenchmarkReport::default();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((task_id, (job, Ok(result)))) => {
                    pending.remove(&task_id);
                    let id = job.id();
                    log_component!(
                        info,
                        "executor",
                        "Job completed",
                        job = id.as_str(),
                        recall = result.recall,
                        elapsed = result.elapsed
                    );
                    report.results.push(result);
                }
                Ok((task_id, (job, Err(err)))) => {
                    pending.remove(&task_id);
                    report.failures.push(self.record_failure(job, err).await);
                }
                // Tasks catch their own panics; this fires on cancellation.
                Err(join_err) => {
                    error!(error = %join_err, "Benchmark task did not complete");
                    if let Some(job) = pending.remove(&join_err.id()) {
                        let err = JobError::Failed(ArcanumError::Job(format!(
                            "task did not complete: {}",
                            join_err
                        )));
                        report.failures.push(self.record_failure(job, err).await);
                    }
                }
            }
        }
        report
    }

    async fn record_failure(&self, job: JobSpec, err: JobError) -> JobFailure {
        let id = job.id();
        error!(job = %id, error = %err.summary(), "Job failed");

        let path = self
            .runner
            .error_log_path_for(&job.scenario_id(), &job.provider_id);
        let body = render_error_log(&job, &err.diagnostic());
        let error_log = match write_error_log(self.runner.log_dir(), &path, &body).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(job = %id, error = %e, "Could not write error log");
                None
            }
        };

        JobFailure {
            job,
            error: err.summary(),
            error_log,
        }
    }
}

async fn write_error_log(dir: &Path, path: &Path, body: &str) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, body).await?;
    Ok(())
}
