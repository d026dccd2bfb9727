//! Non-blocking executor: checks fan out to a worker pool, the verdict comes
//! back through a callback
//!
//! Each check is one job. Jobs record into a `SharedAggregator`; the job that
//! records the last outcome finalizes the result, emits the run summary and
//! delivers it. The callback sits in a take-once slot, so it fires exactly once
//! whether the run completes or the pool refuses a job.

use super::builder::ExecutorConfig;
use super::pool::{ExecutionContext, Job};
use super::result::{ExecutionResult, ResultAggregator, SharedAggregator};
use crate::checks::{panic_message, run_check};
use crate::core::error::{PostureError, PostureResult};
use crate::metrics::{ExecutionEvent, MetricsDispatcher};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Callback receiving the outcome of an async run
pub type ExecutionCallback = Box<dyn FnOnce(PostureResult<ExecutionResult>) + Send + 'static>;

/// Lifecycle of one async run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
  Idle,
  Running,
  /// Every check finished and the result was handed to the callback
  Completed,
  /// The execution context refused work; the callback got an error
  Failed,
}

#[derive(Debug)]
struct StatusInner {
  state: ExecutionState,
  delivered: bool,
}

#[derive(Debug)]
struct RunStatus {
  inner: Mutex<StatusInner>,
  changed: Condvar,
}

impl RunStatus {
  fn new() -> Self {
    Self {
      inner: Mutex::new(StatusInner {
        state: ExecutionState::Idle,
        delivered: false,
      }),
      changed: Condvar::new(),
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, StatusInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn set(&self, state: ExecutionState) {
    self.lock().state = state;
  }

  fn mark_delivered(&self) {
    self.lock().delivered = true;
    self.changed.notify_all();
  }
}

/// Observer for one async run
///
/// Dropping the handle does not cancel anything.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
  status: Arc<RunStatus>,
}

impl ExecutionHandle {
  pub fn state(&self) -> ExecutionState {
    self.status.lock().state
  }

  /// Whether the callback has returned
  pub fn is_delivered(&self) -> bool {
    self.status.lock().delivered
  }

  /// Block until the callback has returned
  ///
  /// Never returns if a check never finishes; prefer `wait_timeout`.
  pub fn wait(&self) -> ExecutionState {
    let mut inner = self.status.lock();
    while !inner.delivered {
      inner = self.status.changed.wait(inner).unwrap_or_else(PoisonError::into_inner);
    }
    inner.state
  }

  /// Block until the callback has returned or the timeout elapses
  pub fn wait_timeout(&self, timeout: Duration) -> Option<ExecutionState> {
    let inner = self.status.lock();
    let (inner, _) = self
      .status
      .changed
      .wait_timeout_while(inner, timeout, |inner| !inner.delivered)
      .unwrap_or_else(PoisonError::into_inner);
    inner.delivered.then_some(inner.state)
  }
}

/// Shared by every job of one run
struct RunShared {
  aggregator: SharedAggregator,
  metrics: MetricsDispatcher,
  callback: Mutex<Option<ExecutionCallback>>,
  status: Arc<RunStatus>,
  started: Instant,
}

impl RunShared {
  fn complete(&self, result: ExecutionResult) {
    let elapsed = self.started.elapsed();
    self.metrics.execution_completed(ExecutionEvent::from_result(&result, elapsed));

    tracing::info!(
      passed = result.passed(),
      total = result.len(),
      failed = result.len() - result.passed_count(),
      elapsed_ms = elapsed.as_millis() as u64,
      "async posture run completed"
    );

    self.status.set(ExecutionState::Completed);
    self.deliver(Ok(result));
  }

  fn fail(&self, err: PostureError) {
    if !self.aggregator.abort() {
      return;
    }
    tracing::warn!(
      error = %err,
      recorded = self.aggregator.recorded(),
      "async posture run failed, discarding partial outcomes"
    );
    self.status.set(ExecutionState::Failed);
    self.deliver(Err(err));
  }

  fn deliver(&self, payload: PostureResult<ExecutionResult>) {
    let callback = self.callback.lock().unwrap_or_else(PoisonError::into_inner).take();
    match callback {
      Some(callback) => {
        if let Err(caught) = panic::catch_unwind(AssertUnwindSafe(move || callback(payload))) {
          tracing::error!(panic = %panic_message(caught.as_ref()), "execution callback panicked");
        }
        self.status.mark_delivered();
      }
      None => tracing::error!("execution result already delivered, dropping second delivery"),
    }
  }
}

/// Runs registered checks concurrently and reports through a callback
///
/// `execute` returns as soon as every check has been submitted. The executor
/// holds no per-run state and can be run again, including while an earlier run
/// is still in flight.
pub struct AsyncExecutor {
  config: ExecutorConfig,
  context: Arc<dyn ExecutionContext>,
}

impl AsyncExecutor {
  pub fn new(config: ExecutorConfig, context: Arc<dyn ExecutionContext>) -> Self {
    Self { config, context }
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Submit every check and return immediately
  ///
  /// `callback` is invoked exactly once with either the aggregated result or a
  /// coordination error. It runs on a worker thread, except when there are no
  /// checks or the first submission is refused: then it runs before `execute`
  /// returns.
  pub fn execute<F>(&self, callback: F) -> ExecutionHandle
  where
    F: FnOnce(PostureResult<ExecutionResult>) + Send + 'static,
  {
    let checks = self.config.checks();
    let callback: ExecutionCallback = Box::new(callback);
    let status = Arc::new(RunStatus::new());
    let handle = ExecutionHandle { status: status.clone() };

    let shared = Arc::new(RunShared {
      aggregator: SharedAggregator::new(checks.len()),
      metrics: self.config.dispatcher().clone(),
      callback: Mutex::new(Some(callback)),
      status,
      started: Instant::now(),
    });

    shared.status.set(ExecutionState::Running);
    tracing::debug!(checks = checks.len(), device = %self.config.device().label(), "starting async posture run");

    if checks.is_empty() {
      shared.complete(ResultAggregator::new().finish());
      return handle;
    }

    let slow_threshold = self.config.settings().slow_check_threshold();

    for (id, check) in checks.iter() {
      let job_shared = shared.clone();
      let check = check.clone();
      let check_id = id.to_string();
      let device = self.config.device().clone();

      let job: Job = Box::new(move || {
        let run = run_check(&check_id, check.as_ref(), &device, slow_threshold);
        job_shared.metrics.check_completed(&run.outcome, run.duration);
        if let Some(result) = job_shared.aggregator.record(run.outcome) {
          job_shared.complete(result);
        }
      });

      if let Err(err) = self.context.spawn(job) {
        let err = if err.is_coordination() {
          err
        } else {
          PostureError::coordination(format!("could not schedule check '{}': {}", id, err))
        };
        shared.fail(err);
        break;
      }
    }

    handle
  }
}

impl fmt::Debug for AsyncExecutor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AsyncExecutor").field("config", &self.config).finish_non_exhaustive()
  }
}
