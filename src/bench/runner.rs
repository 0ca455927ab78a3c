//! Scenario runner: plays a scenario through an agent, scores recall and
//! writes the per-run JSON log.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::error::Result;

use super::scenario::Scenario;

/// Outcome of one scenario step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    /// Every expected substring was present
    Pass,
    /// At least one expected substring was missing
    Fail,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pass => write!(f, "PASS"),
            StepStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// One entry of the benchmark log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Raw player input
    pub input: String,
    /// Narrator reply
    pub response: String,
    /// PASS or FAIL
    pub status: StepStatus,
    /// Wall-clock seconds spent in the agent step
    pub elapsed: f64,
}

/// Result of a completed scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Step results in play order
    pub steps: Vec<StepResult>,
    /// passes / total
    pub recall: f64,
    /// Where the log was written
    pub log_path: PathBuf,
}

impl ScenarioOutcome {
    /// Number of passing steps.
    pub fn passes(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Pass)
            .count()
    }
}

/// PASS iff every expected substring occurs in `response`, ignoring case.
///
/// An empty expectation list always passes.
pub fn evaluate(response: &str, expected: &[String]) -> StepStatus {
    let haystack = response.to_lowercase();
    if expected
        .iter()
        .all(|token| haystack.contains(&token.to_lowercase()))
    {
        StepStatus::Pass
    } else {
        StepStatus::Fail
    }
}

/// Fraction of passing steps. A run with no steps scores 0.0.
pub fn recall(steps: &[StepResult]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let passes = steps.iter().filter(|s| s.status == StepStatus::Pass).count();
    passes as f64 / steps.len() as f64
}

/// Filesystem-safe form of a provider id (`openai/gpt-4o` -> `openai_gpt-4o`).
pub fn sanitize_provider_id(provider_id: &str) -> String {
    provider_id.replace(['/', '\\', ':'], "_")
}

/// `<scenario>_<provider>_<UTC millis timestamp>_<nonce>`
///
/// The random nonce keeps names unique when the same scenario and provider
/// run concurrently within one millisecond.
pub fn run_file_stem(scenario_id: &str, provider_id: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f");
    let nonce: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!(
        "{}_{}_{}_{}",
        scenario_id,
        sanitize_provider_id(provider_id),
        timestamp,
        nonce
    )
}

/// Plays scenarios and writes one JSON log per run.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    log_dir: PathBuf,
}

impl ScenarioRunner {
    /// Create a runner writing logs under `log_dir` (created on first write).
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Directory receiving run logs and error logs.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Fresh, unique log path for a run.
    pub fn log_path_for(&self, scenario_id: &str, provider_id: &str) -> PathBuf {
        self.log_dir
            .join(format!("{}.json", run_file_stem(scenario_id, provider_id)))
    }

    /// Fresh, unique error-log path for a failed job.
    pub fn error_log_path_for(&self, scenario_id: &str, provider_id: &str) -> PathBuf {
        self.log_dir
            .join(format!("{}_error.log", run_file_stem(scenario_id, provider_id)))
    }

    /// Play every step of `scenario` through `agent`.
    ///
    /// A FAIL does not stop the run. An agent error stops it: the steps
    /// completed so far are still logged, then the error is returned unchanged.
    pub async fn run(
        &self,
        scenario: &Scenario,
        agent: &mut Agent,
        provider_id: &str,
    ) -> Result<ScenarioOutcome> {
        let total = scenario.len();
        let mut steps = Vec::with_capacity(total);
        let log_path = self.log_path_for(&scenario.id, provider_id);

        for (idx, step) in scenario.steps.iter().enumerate() {
            let started = Instant::now();
            let response = match agent.step(&step.input).await {
                Ok(response) => response,
                Err(e) => {
                    match self.write_log(&log_path, &steps).await {
                        Ok(()) => warn!(
                            provider = provider_id,
                            scenario = %scenario.id,
                            step = idx + 1,
                            log = %log_path.display(),
                            "Scenario aborted; partial log written"
                        ),
                        Err(write_err) => warn!(
                            provider = provider_id,
                            scenario = %scenario.id,
                            error = %write_err,
                            "Scenario aborted; partial log could not be written"
                        ),
                    }
                    return Err(e);
                }
            };
            let elapsed = started.elapsed().as_secs_f64();
            let status = evaluate(&response, &step.expect_description_contains);

            info!(
                provider = provider_id,
                scenario = %scenario.id,
                step = idx + 1,
                total,
                status = %status,
                elapsed,
                "Step finished"
            );

            steps.push(StepResult {
                input: step.input.clone(),
                response,
                status,
                elapsed,
            });
        }

        self.write_log(&log_path, &steps).await?;
        let recall = recall(&steps);

        Ok(ScenarioOutcome {
            steps,
            recall,
            log_path,
        })
    }

    async fn write_log(&self, path: &Path, steps: &[StepResult]) -> Result<()> {
        tokio::fs::create_dir_all(&self.log_dir).await?;
        let body = serde_json::to_string_pretty(steps)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}
