//! Result aggregation shared by both executors

use crate::checks::CheckOutcome;
use crate::core::error::{PostureError, PostureResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Combined verdict of one run
///
/// `passed` is derived from the outcomes when the result is built and cannot be
/// set any other way. An empty run passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
  passed: bool,
  outcomes: BTreeMap<String, CheckOutcome>,
}

impl ExecutionResult {
  fn from_outcomes(outcomes: BTreeMap<String, CheckOutcome>) -> Self {
    let passed = outcomes.values().all(CheckOutcome::passed);
    Self { passed, outcomes }
  }

  /// True iff every outcome passed
  pub fn passed(&self) -> bool {
    self.passed
  }

  /// Outcomes keyed by check id
  pub fn outcomes(&self) -> &BTreeMap<String, CheckOutcome> {
    &self.outcomes
  }

  pub fn outcome(&self, check_id: &str) -> Option<&CheckOutcome> {
    self.outcomes.get(check_id)
  }

  /// Outcomes that did not pass
  pub fn failed(&self) -> Vec<&CheckOutcome> {
    self.outcomes.values().filter(|o| !o.passed()).collect()
  }

  pub fn passed_count(&self) -> usize {
    self.outcomes.values().filter(|o| o.passed()).count()
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }

  /// Convert to JSON
  pub fn to_json(&self) -> PostureResult<String> {
    serde_json::to_string_pretty(self)
      .map_err(|e| PostureError::message(format!("JSON serialization failed: {}", e)))
  }
}

/// Single-threaded accumulator used by the sync executor
#[derive(Debug, Default)]
pub struct ResultAggregator {
  outcomes: BTreeMap<String, CheckOutcome>,
}

impl ResultAggregator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record an outcome; returns false if its id was already recorded
  pub fn record(&mut self, outcome: CheckOutcome) -> bool {
    if self.outcomes.contains_key(outcome.check_id()) {
      tracing::debug!(check = %outcome.check_id(), "duplicate outcome ignored");
      return false;
    }
    self.outcomes.insert(outcome.check_id().to_string(), outcome);
    true
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }

  /// Build the final result
  pub fn finish(self) -> ExecutionResult {
    ExecutionResult::from_outcomes(self.outcomes)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Collecting,
  Finished,
  Aborted,
}

#[derive(Debug)]
struct Pending {
  aggregator: ResultAggregator,
  phase: Phase,
}

/// Thread-safe accumulator used by the async executor
///
/// Knows how many outcomes to expect. The `record` call that supplies the last
/// one gets the finished result; every other call gets `None`. Once aborted it
/// never produces a result.
#[derive(Debug)]
pub struct SharedAggregator {
  expected: usize,
  pending: Mutex<Pending>,
}

impl SharedAggregator {
  pub fn new(expected: usize) -> Self {
    Self {
      expected,
      pending: Mutex::new(Pending {
        aggregator: ResultAggregator::new(),
        phase: Phase::Collecting,
      }),
    }
  }

  /// Record an outcome, returning the result if this was the final one
  pub fn record(&self, outcome: CheckOutcome) -> Option<ExecutionResult> {
    // A panic while holding the lock cannot leave the map half-written, so keep going.
    let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
    if pending.phase != Phase::Collecting {
      tracing::debug!(check = %outcome.check_id(), phase = ?pending.phase, "outcome arrived after run closed");
      return None;
    }

    pending.aggregator.record(outcome);
    if pending.aggregator.len() < self.expected {
      return None;
    }

    pending.phase = Phase::Finished;
    let aggregator = std::mem::take(&mut pending.aggregator);
    Some(aggregator.finish())
  }

  /// Stop accepting outcomes; returns true if this call closed the run
  pub fn abort(&self) -> bool {
    let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
    if pending.phase != Phase::Collecting {
      return false;
    }
    pending.phase = Phase::Aborted;
    true
  }

  /// Number of outcomes recorded so far
  pub fn recorded(&self) -> usize {
    let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
    match pending.phase {
      Phase::Finished => self.expected,
      _ => pending.aggregator.len(),
    }
  }
}
