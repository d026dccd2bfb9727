//! Blocking executor: every check runs on the caller's thread

use super::builder::ExecutorConfig;
use super::result::{ExecutionResult, ResultAggregator};
use crate::checks::run_check;
use crate::metrics::ExecutionEvent;
use std::time::Instant;

/// Runs registered checks one after another and returns the verdict
///
/// A run blocks for the sum of all check durations. The executor holds no
/// per-run state, so it can be run again; each call builds a fresh result.
#[derive(Debug)]
pub struct SyncExecutor {
  config: ExecutorConfig,
}

impl SyncExecutor {
  pub fn new(config: ExecutorConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Run all checks and aggregate their outcomes
  pub fn execute(&self) -> ExecutionResult {
    let started = Instant::now();
    let checks = self.config.checks();
    let slow_threshold = self.config.settings().slow_check_threshold();

    tracing::debug!(checks = checks.len(), device = %self.config.device().label(), "starting sync posture run");

    let metrics = self.config.dispatcher();
    let mut aggregator = ResultAggregator::new();

    for (id, check) in checks.iter() {
      let run = run_check(id, check.as_ref(), self.config.device(), slow_threshold);
      metrics.check_completed(&run.outcome, run.duration);
      aggregator.record(run.outcome);
    }

    let result = aggregator.finish();
    let elapsed = started.elapsed();
    metrics.execution_completed(ExecutionEvent::from_result(&result, elapsed));

    tracing::info!(
      passed = result.passed(),
      total = result.len(),
      failed = result.len() - result.passed_count(),
      elapsed_ms = elapsed.as_millis() as u64,
      "posture run completed"
    );

    result
  }
}
