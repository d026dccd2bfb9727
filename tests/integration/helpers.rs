//! Test helpers for integration tests

#![allow(dead_code)]

use posture_guard::{
  AsyncExecutor, CheckEvent, CheckOutcome, CheckType, DeviceContext, ExecutionEvent, ExecutionResult, MetricsReporter,
  PostureError, PostureResult, SecurityCheck,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Stand-in for a platform handle
#[derive(Debug)]
pub struct FakeHandset {
  pub rooted: bool,
  pub debugger_attached: bool,
}

pub fn device() -> DeviceContext {
  DeviceContext::labeled(
    "fake-handset",
    FakeHandset {
      rooted: false,
      debugger_attached: false,
    },
  )
}

/// Check that passes or fails after an optional delay
pub struct StaticCheck {
  pub id: String,
  pub pass: bool,
  pub delay: Duration,
  pub runs: Arc<AtomicUsize>,
}

impl StaticCheck {
  pub fn passing(id: &str) -> Self {
    Self::new(id, true)
  }

  pub fn failing(id: &str) -> Self {
    Self::new(id, false)
  }

  fn new(id: &str, pass: bool) -> Self {
    Self {
      id: id.to_string(),
      pass,
      delay: Duration::ZERO,
      runs: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn run_count(&self) -> Arc<AtomicUsize> {
    self.runs.clone()
  }
}

impl SecurityCheck for StaticCheck {
  fn id(&self) -> &str {
    &self.id
  }

  fn execute(&self, _device: &DeviceContext) -> PostureResult<CheckOutcome> {
    self.runs.fetch_add(1, Ordering::SeqCst);
    if !self.delay.is_zero() {
      thread::sleep(self.delay);
    }
    if self.pass {
      Ok(CheckOutcome::pass(&self.id))
    } else {
      Ok(CheckOutcome::fail(&self.id, format!("{} detected", self.id)))
    }
  }
}

/// Check that reads the fake handset
pub struct RootedCheck;

impl SecurityCheck for RootedCheck {
  fn id(&self) -> &str {
    "rooted"
  }

  fn name(&self) -> &str {
    "Root / jailbreak detection"
  }

  fn execute(&self, device: &DeviceContext) -> PostureResult<CheckOutcome> {
    let handset = device
      .downcast_ref::<FakeHandset>()
      .ok_or_else(|| PostureError::check(self.id(), "unsupported device"))?;
    if handset.rooted {
      Ok(CheckOutcome::fail(self.id(), "su binary found"))
    } else {
      Ok(CheckOutcome::pass(self.id()).with_detail("no root indicators"))
    }
  }
}

/// Check that always returns an error
pub struct ErroringCheck(pub &'static str);

impl SecurityCheck for ErroringCheck {
  fn id(&self) -> &str {
    self.0
  }

  fn execute(&self, _device: &DeviceContext) -> PostureResult<CheckOutcome> {
    Err(PostureError::check(self.0, "permission denied reading /proc/self/status"))
  }
}

/// Check that always panics
pub struct PanickingCheck(pub &'static str);

impl SecurityCheck for PanickingCheck {
  fn id(&self) -> &str {
    self.0
  }

  fn execute(&self, _device: &DeviceContext) -> PostureResult<CheckOutcome> {
    panic!("probe crashed");
  }
}

/// Probe kinds an embedder might expose
pub enum Probe {
  Rooted,
  Debugger,
}

impl CheckType for Probe {
  fn security_check(&self) -> Arc<dyn SecurityCheck> {
    match self {
      Probe::Rooted => Arc::new(RootedCheck),
      Probe::Debugger => Arc::new(StaticCheck::passing("debugger")),
    }
  }
}

/// Reporter that records every event
#[derive(Default)]
pub struct RecordingReporter {
  pub checks: Mutex<Vec<CheckEvent>>,
  pub runs: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingReporter {
  pub fn check_ids(&self) -> Vec<String> {
    let mut ids: Vec<_> = self.checks.lock().unwrap().iter().map(|e| e.check_id.clone()).collect();
    ids.sort();
    ids
  }

  pub fn run_count(&self) -> usize {
    self.runs.lock().unwrap().len()
  }
}

impl MetricsReporter for RecordingReporter {
  fn check_completed(&self, event: &CheckEvent) -> PostureResult<()> {
    self.checks.lock().unwrap().push(event.clone());
    Ok(())
  }

  fn execution_completed(&self, event: &ExecutionEvent) -> PostureResult<()> {
    self.runs.lock().unwrap().push(event.clone());
    Ok(())
  }
}

/// Reporter that fails on every event, alternating errors and panics
#[derive(Default)]
pub struct HostileReporter {
  pub calls: AtomicUsize,
}

impl MetricsReporter for HostileReporter {
  fn check_completed(&self, _event: &CheckEvent) -> PostureResult<()> {
    if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
      Err(PostureError::metrics("collector unreachable"))
    } else {
      panic!("collector crashed");
    }
  }

  fn execution_completed(&self, _event: &ExecutionEvent) -> PostureResult<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    panic!("collector crashed on summary");
  }
}

/// Reporter that takes its time on every hook
pub struct SlowReporter {
  pub delay: Duration,
  pub calls: AtomicUsize,
}

impl SlowReporter {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      calls: AtomicUsize::new(0),
    }
  }
}

impl MetricsReporter for SlowReporter {
  fn check_completed(&self, _event: &CheckEvent) -> PostureResult<()> {
    thread::sleep(self.delay);
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  fn execution_completed(&self, _event: &ExecutionEvent) -> PostureResult<()> {
    thread::sleep(self.delay);
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

/// Poll `condition` until it holds or five seconds pass
pub fn eventually(condition: impl Fn() -> bool) -> bool {
  let deadline = Instant::now() + Duration::from_secs(5);
  while Instant::now() < deadline {
    if condition() {
      return true;
    }
    thread::sleep(Duration::from_millis(5));
  }
  condition()
}

/// Outcome of an async run as seen by the caller
pub struct Delivery {
  pub result: PostureResult<ExecutionResult>,
  pub callbacks: Arc<AtomicUsize>,
}

/// Run an async executor and wait for its callback
pub fn run_async(executor: &AsyncExecutor) -> Delivery {
  let callbacks = Arc::new(AtomicUsize::new(0));
  let counter = callbacks.clone();
  let (tx, rx) = mpsc::channel();

  executor.execute(move |result| {
    counter.fetch_add(1, Ordering::SeqCst);
    let _ = tx.send(result);
  });

  let result = rx
    .recv_timeout(Duration::from_secs(30))
    .expect("callback was not delivered in time");

  // Give any stray second delivery a chance to show up.
  thread::sleep(Duration::from_millis(20));
  Delivery { result, callbacks }
}
