//! Metrics hooks for check executions
//!
//! The engine reports one `CheckEvent` per finished check and one
//! `ExecutionEvent` per finished run. Reporting is best-effort: a reporter that
//! errors or panics is logged and otherwise ignored, so it can never change a
//! verdict or delay its delivery.

use crate::checks::{CheckOutcome, panic_message};
use crate::core::error::PostureResult;
use crate::executor::ExecutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Emitted once per check per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEvent {
  pub check_id: String,
  pub outcome: CheckOutcome,
  pub duration_ms: u64,
  pub timestamp: DateTime<Utc>,
}

impl CheckEvent {
  pub fn new(outcome: &CheckOutcome, duration: Duration) -> Self {
    Self {
      check_id: outcome.check_id().to_string(),
      outcome: outcome.clone(),
      duration_ms: duration.as_millis() as u64,
      timestamp: Utc::now(),
    }
  }
}

/// Emitted once per run, after every check has finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
  pub passed: bool,
  pub total: usize,
  pub failed: usize,
  pub duration_ms: u64,
  pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
  pub fn from_result(result: &ExecutionResult, elapsed: Duration) -> Self {
    Self {
      passed: result.passed(),
      total: result.len(),
      failed: result.len() - result.passed_count(),
      duration_ms: elapsed.as_millis() as u64,
      timestamp: Utc::now(),
    }
  }
}

/// Receiver for execution metrics
///
/// Hooks run on a dedicated metrics thread, one event at a time, in the order
/// the executor produced them. Returned errors are logged and dropped.
pub trait MetricsReporter: Send + Sync {
  fn check_completed(&self, event: &CheckEvent) -> PostureResult<()>;

  fn execution_completed(&self, event: &ExecutionEvent) -> PostureResult<()>;
}

/// Hands events to an optional reporter without ever waiting on it
///
/// Events run on one dedicated thread in submission order, so a slow or hung
/// reporter delays only later events, never a check or a result. Whatever the
/// reporter returns or throws is logged and dropped.
#[derive(Clone, Default)]
pub(crate) struct MetricsDispatcher {
  sink: Option<Sink>,
}

#[derive(Clone)]
struct Sink {
  reporter: Arc<dyn MetricsReporter>,
  lane: Arc<rayon::ThreadPool>,
}

impl MetricsDispatcher {
  pub(crate) fn new(reporter: Option<Arc<dyn MetricsReporter>>) -> Self {
    let Some(reporter) = reporter else {
      return Self::default();
    };

    let lane = rayon::ThreadPoolBuilder::new()
      .num_threads(1)
      .thread_name(|_| "posture-metrics".to_string())
      .build();

    match lane {
      Ok(lane) => Self {
        sink: Some(Sink {
          reporter,
          lane: Arc::new(lane),
        }),
      },
      Err(err) => {
        tracing::warn!(error = %err, "could not start metrics thread, metrics disabled");
        Self::default()
      }
    }
  }

  pub(crate) fn reporter(&self) -> Option<&Arc<dyn MetricsReporter>> {
    self.sink.as_ref().map(|sink| &sink.reporter)
  }

  pub(crate) fn is_enabled(&self) -> bool {
    self.sink.is_some()
  }

  pub(crate) fn check_completed(&self, outcome: &CheckOutcome, duration: Duration) {
    if let Some(sink) = &self.sink {
      let event = CheckEvent::new(outcome, duration);
      let reporter = sink.reporter.clone();
      rayon::ThreadPool::spawn(&sink.lane, move || {
        deliver("check_completed", || reporter.check_completed(&event))
      });
    }
  }

  pub(crate) fn execution_completed(&self, event: ExecutionEvent) {
    if let Some(sink) = &self.sink {
      let reporter = sink.reporter.clone();
      rayon::ThreadPool::spawn(&sink.lane, move || {
        deliver("execution_completed", || reporter.execution_completed(&event))
      });
    }
  }
}

fn deliver(hook: &'static str, send: impl FnOnce() -> PostureResult<()>) {
  match panic::catch_unwind(AssertUnwindSafe(send)) {
    Ok(Ok(())) => {}
    Ok(Err(err)) => tracing::warn!(hook, error = %err, "metrics reporter failed, event dropped"),
    Err(payload) => {
      tracing::warn!(hook, panic = %panic_message(payload.as_ref()), "metrics reporter panicked, event dropped")
    }
  }
}
