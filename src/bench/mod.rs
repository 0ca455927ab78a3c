//! Benchmark harness: scenarios, the runner that scores them, the concurrent
//! executor and the window-size sweep.
//!
//! ```text
//! scenario files ──> JobSpec (scenario × provider) ──> BenchmarkExecutor
//!                                                          │  one Agent per job
//!                                                          ▼
//!                                                    ScenarioRunner ──> logs/*.json
//!                                                          │
//!                         WindowSweep ──(RecallProbe)──────┘
//! ```

pub mod executor;
pub mod runner;
pub mod scenario;
pub mod sweep;

pub use executor::{
    build_matrix, AgentFactory, BenchmarkExecutor, BenchmarkReport, JobFailure, JobResult,
    JobSpec, OpenRouterAgentFactory,
};
pub use runner::{evaluate, recall, ScenarioOutcome, ScenarioRunner, StepResult, StepStatus};
pub use scenario::{resolve_scenario_paths, Scenario, ScenarioStep};
pub use sweep::{
    render_summary, ExecutorProbe, ProbeOutcome, RecallProbe, SweepProbe, SweepResult, WindowSweep,
};
