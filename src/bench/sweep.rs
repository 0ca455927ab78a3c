//! Window-size sweep: the smallest memory window that still gives full recall.
//!
//! For each provider the maximum window is verified first. If it misses full
//! recall (or errors) the provider is "not found" and nothing smaller is tried.
//! Otherwise windows are probed one at a time downwards.
//!
//! With [`ProbeStrategy::StopAtFirstFailure`] the descent ends at the first
//! window below full recall. That assumes recall never improves as the window
//! shrinks, which is a heuristic. [`ProbeStrategy::Exhaustive`] probes every
//! window down to the minimum and reports the smallest one that passed.
//!
//! Probes run sequentially within a provider; providers run concurrently.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{MemoryStrategy, ProbeStrategy};
use crate::error::{ArcanumError, Result};

use super::executor::{BenchmarkExecutor, JobSpec};

/// Measures recall for one provider at one window size.
#[async_trait]
pub trait RecallProbe: Send + Sync {
    async fn probe(&self, provider_id: &str, window_size: usize) -> Result<f64>;
}

/// Probe that plays a scenario file through a [`BenchmarkExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorProbe {
    executor: BenchmarkExecutor,
    scenario_path: PathBuf,
    strategy: MemoryStrategy,
}

impl ExecutorProbe {
    pub fn new(
        executor: BenchmarkExecutor,
        scenario_path: impl Into<PathBuf>,
        strategy: MemoryStrategy,
    ) -> Self {
        Self {
            executor,
            scenario_path: scenario_path.into(),
            strategy,
        }
    }
}

#[async_trait]
impl RecallProbe for ExecutorProbe {
    async fn probe(&self, provider_id: &str, window_size: usize) -> Result<f64> {
        let job = JobSpec::new(
            self.scenario_path.clone(),
            provider_id,
            window_size,
            self.strategy,
        );
        Ok(self.executor.run_job_isolated(&job).await?.recall)
    }
}

/// What happened at one window size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "value", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Full recall
    Passed(f64),
    /// Recall below 1.0
    Failed(f64),
    /// The run errored; counts as neither pass nor fail
    Errored(String),
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Passed(recall) => write!(f, "pass (recall={:.2})", recall),
            ProbeOutcome::Failed(recall) => write!(f, "fail (recall={:.2})", recall),
            ProbeOutcome::Errored(msg) => write!(f, "error ({})", msg),
        }
    }
}

/// One entry in the descent trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepProbe {
    pub window: usize,
    pub outcome: ProbeOutcome,
}

/// Sweep result for one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub provider_id: String,
    /// Smallest window with full recall, or `None` if the maximum failed.
    pub minimal_window: Option<usize>,
    /// Largest window tried
    pub max_window: usize,
    /// Probes in the order they ran
    pub trace: Vec<SweepProbe>,
}

/// Linear window-size search.
pub struct WindowSweep {
    probe: Arc<dyn RecallProbe>,
    min_window: usize,
    max_window: usize,
    strategy: ProbeStrategy,
}

impl std::fmt::Debug for WindowSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSweep")
            .field("min_window", &self.min_window)
            .field("max_window", &self.max_window)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl WindowSweep {
    /// Create a sweep over `min_window..=max_window`.
    pub fn new(
        probe: Arc<dyn RecallProbe>,
        min_window: usize,
        max_window: usize,
        strategy: ProbeStrategy,
    ) -> Result<Self> {
        if min_window == 0 {
            return Err(ArcanumError::Config(
                "sweep min_window must be at least 1".to_string(),
            ));
        }
        if min_window > max_window {
            return Err(ArcanumError::Config(format!(
                "sweep min_window ({}) exceeds max_window ({})",
                min_window, max_window
            )));
        }
        Ok(Self {
            probe,
            min_window,
            max_window,
            strategy,
        })
    }

    async fn measure(&self, provider_id: &str, window: usize) -> ProbeOutcome {
        match self.probe.probe(provider_id, window).await {
            Ok(recall) if recall >= 1.0 => ProbeOutcome::Passed(recall),
            Ok(recall) => ProbeOutcome::Failed(recall),
            Err(e) => ProbeOutcome::Errored(e.to_string()),
        }
    }

    /// Sweep one provider.
    pub async fn sweep(&self, provider_id: &str) -> SweepResult {
        let mut trace = Vec::new();

        info!(provider = provider_id, window = self.max_window, "Verifying full window");
        let verification = self.measure(provider_id, self.max_window).await;
        let verified = matches!(verification, ProbeOutcome::Passed(_));
        if !verified {
            warn!(
                provider = provider_id,
                window = self.max_window,
                outcome = %verification,
                "Full window did not reach full recall; provider not found"
            );
        }
        trace.push(SweepProbe {
            window: self.max_window,
            outcome: verification,
        });

        if !verified {
            return SweepResult {
                provider_id: provider_id.to_string(),
                minimal_window: None,
                max_window: self.max_window,
                trace,
            };
        }

        let mut last_pass = self.max_window;
        for window in (self.min_window..self.max_window).rev() {
            let outcome = self.measure(provider_id, window).await;
            info!(provider = provider_id, window, outcome = %outcome, "Probe finished");

            let stop = match &outcome {
                ProbeOutcome::Passed(_) => {
                    last_pass = window;
                    false
                }
                ProbeOutcome::Failed(_) => self.strategy == ProbeStrategy::StopAtFirstFailure,
                ProbeOutcome::Errored(msg) => {
                    warn!(provider = provider_id, window, error = %msg, "Probe errored; skipping window");
                    false
                }
            };
            trace.push(SweepProbe { window, outcome });
            if stop {
                break;
            }
        }

        info!(provider = provider_id, minimal_window = last_pass, "Sweep finished");
        SweepResult {
            provider_id: provider_id.to_string(),
            minimal_window: Some(last_pass),
            max_window: self.max_window,
            trace,
        }
    }

    /// Sweep several providers, at most `concurrency` at a time.
    ///
    /// Results come back in completion order.
    pub async fn sweep_all(&self, providers: &[String], concurrency: usize) -> Vec<SweepResult> {
        let sweeps = providers
            .iter()
            .cloned()
            .map(|provider| async move { self.sweep(&provider).await });
        stream::iter(sweeps)
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Console summary: minimal window per provider plus the descent trace.
pub fn render_summary(results: &[SweepResult]) -> String {
    let mut out = String::from("Sweep Summary:\n");
    for result in results {
        let minimal = match result.minimal_window {
            Some(window) => window.to_string(),
            None => format!("not found (>= {})", result.max_window),
        };
        out.push_str(&format!(
            "{}: minimal window_size = {}\n",
            result.provider_id, minimal
        ));
        for probe in &result.trace {
            out.push_str(&format!("  window {:>3}: {}\n", probe.window, probe.outcome));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Recall as a function of window size, with optional per-window errors.
    struct SyntheticProbe {
        recall: fn(usize) -> f64,
        errors_at: Vec<usize>,
        probed: Mutex<HashMap<String, Vec<usize>>>,
    }

    impl SyntheticProbe {
        fn new(recall: fn(usize) -> f64) -> Self {
            Self {
                recall,
                errors_at: Vec::new(),
                probed: Mutex::new(HashMap::new()),
            }
        }

        fn probed(&self, provider: &str) -> Vec<usize> {
            self.probed
                .lock()
                .unwrap()
                .get(provider)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl RecallProbe for SyntheticProbe {
        async fn probe(&self, provider_id: &str, window_size: usize) -> Result<f64> {
            self.probed
                .lock()
                .unwrap()
                .entry(provider_id.to_string())
                .or_default()
                .push(window_size);
            if self.errors_at.contains(&window_size) {
                return Err(ArcanumError::Provider("HTTP 503 after retries".into()));
            }
            Ok((self.recall)(window_size))
        }
    }

    fn threshold_three(window: usize) -> f64 {
        if window >= 3 {
            1.0
        } else {
            0.0
        }
    }

    fn sweep(probe: Arc<SyntheticProbe>, strategy: ProbeStrategy) -> WindowSweep {
        WindowSweep::new(probe, 1, 10, strategy).unwrap()
    }

    #[tokio::test]
    async fn test_finds_threshold() {
        let probe = Arc::new(SyntheticProbe::new(threshold_three));
        let result = sweep(probe.clone(), ProbeStrategy::StopAtFirstFailure)
            .sweep("p")
            .await;

        assert_eq!(result.minimal_window, Some(3));
        assert_eq!(probe.probed("p"), vec![10, 9, 8, 7, 6, 5, 4, 3, 2]);
        assert_eq!(result.trace.last().unwrap().outcome, ProbeOutcome::Failed(0.0));
    }

    #[tokio::test]
    async fn test_full_window_failure_is_not_found_without_descent() {
        let probe = Arc::new(SyntheticProbe::new(|_| 0.5));
        let result = sweep(probe.clone(), ProbeStrategy::StopAtFirstFailure)
            .sweep("p")
            .await;

        assert_eq!(result.minimal_window, None);
        assert_eq!(probe.probed("p"), vec![10]);
        assert_eq!(result.trace.len(), 1);
    }

    #[tokio::test]
    async fn test_full_window_error_is_not_found() {
        let mut probe = SyntheticProbe::new(|_| 1.0);
        probe.errors_at = vec![10];
        let probe = Arc::new(probe);
        let result = sweep(probe.clone(), ProbeStrategy::StopAtFirstFailure)
            .sweep("p")
            .await;

        assert_eq!(result.minimal_window, None);
        assert!(matches!(result.trace[0].outcome, ProbeOutcome::Errored(_)));
    }

    #[tokio::test]
    async fn test_errored_window_is_skipped() {
        let mut probe = SyntheticProbe::new(threshold_three);
        probe.errors_at = vec![5];
        let probe = Arc::new(probe);
        let result = sweep(probe.clone(), ProbeStrategy::StopAtFirstFailure)
            .sweep("p")
            .await;

        assert_eq!(result.minimal_window, Some(3));
        assert_eq!(probe.probed("p"), vec![10, 9, 8, 7, 6, 5, 4, 3, 2]);
        assert!(matches!(result.trace[5].outcome, ProbeOutcome::Errored(_)));
    }

    #[tokio::test]
    async fn test_stop_at_first_failure_misses_dip_recovery() {
        // Passes at 10..=6, dips at 5, passes again at 4 and 3.
        let dip = |w: usize| if w == 5 || w < 3 { 0.0 } else { 1.0 };
        let probe = Arc::new(SyntheticProbe::new(dip));

        let greedy = sweep(probe.clone(), ProbeStrategy::StopAtFirstFailure)
            .sweep("greedy")
            .await;
        assert_eq!(greedy.minimal_window, Some(6));

        let exhaustive = sweep(probe.clone(), ProbeStrategy::Exhaustive)
            .sweep("exhaustive")
            .await;
        assert_eq!(exhaustive.minimal_window, Some(3));
        assert_eq!(probe.probed("exhaustive").len(), 10);
    }

    #[tokio::test]
    async fn test_min_equals_max_only_verifies() {
        let probe = Arc::new(SyntheticProbe::new(|_| 1.0));
        let result = WindowSweep::new(probe.clone(), 4, 4, ProbeStrategy::StopAtFirstFailure)
            .unwrap()
            .sweep("p")
            .await;
        assert_eq!(result.minimal_window, Some(4));
        assert_eq!(probe.probed("p"), vec![4]);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let probe: Arc<dyn RecallProbe> = Arc::new(SyntheticProbe::new(|_| 1.0));
        assert!(WindowSweep::new(probe.clone(), 0, 5, ProbeStrategy::Exhaustive).is_err());
        assert!(WindowSweep::new(probe, 6, 5, ProbeStrategy::Exhaustive).is_err());
    }

    #[tokio::test]
    async fn test_sweep_all_covers_every_provider() {
        let probe = Arc::new(SyntheticProbe::new(threshold_three));
        let providers: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut results = sweep(probe, ProbeStrategy::StopAtFirstFailure)
            .sweep_all(&providers, 2)
            .await;
        results.sort_by(|x, y| x.provider_id.cmp(&y.provider_id));

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.minimal_window == Some(3)));
    }

    #[tokio::test]
    async fn test_sweep_all_runs_on_spawned_task() {
        let sweep = Arc::new(sweep(
            Arc::new(SyntheticProbe::new(threshold_three)),
            ProbeStrategy::StopAtFirstFailure,
        ));
        let providers: Vec<String> = vec!["a".into(), "b".into()];

        let handle = tokio::spawn(async move { sweep.sweep_all(&providers, 2).await });
        let results = handle.await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.minimal_window == Some(3)));
    }

    #[test]
    fn test_render_summary() {
        let results = vec![
            SweepResult {
                provider_id: "x/good".into(),
                minimal_window: Some(3),
                max_window: 10,
                trace: vec![SweepProbe {
                    window: 10,
                    outcome: ProbeOutcome::Passed(1.0),
                }],
            },
            SweepResult {
                provider_id: "y/bad".into(),
                minimal_window: None,
                max_window: 10,
                trace: vec![SweepProbe {
                    window: 10,
                    outcome: ProbeOutcome::Failed(0.5),
                }],
            },
        ];
        let text = render_summary(&results);
        assert!(text.contains("x/good: minimal window_size = 3"));
        assert!(text.contains("y/bad: minimal window_size = not found (>= 10)"));
        assert!(text.contains("window  10: fail (recall=0.50)"));
    }
}
