//! Runs one check with fault isolation

use super::context::DeviceContext;
use super::trait_def::{CheckOutcome, SecurityCheck};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Outcome of one check plus how long it took
#[derive(Debug, Clone)]
pub struct CheckRun {
  pub outcome: CheckOutcome,
  pub duration: Duration,
}

/// Run a check, turning errors and panics into a failing outcome
///
/// `check_id` is the id the check was registered under; the returned outcome is
/// always keyed by it. Nothing a check does can escape this function.
pub fn run_check(
  check_id: &str,
  check: &dyn SecurityCheck,
  device: &DeviceContext,
  slow_threshold: Option<Duration>,
) -> CheckRun {
  let start = Instant::now();
  let result = panic::catch_unwind(AssertUnwindSafe(|| check.execute(device)));
  let duration = start.elapsed();

  let outcome = match result {
    Ok(Ok(outcome)) => outcome.rekeyed(check_id),
    Ok(Err(err)) => {
      tracing::warn!(check = %check_id, error = %err, "check failed to run");
      CheckOutcome::fail(check_id, format!("Check failed to run: {}", err))
    }
    Err(payload) => {
      let message = panic_message(payload.as_ref());
      tracing::warn!(check = %check_id, panic = %message, "check panicked");
      CheckOutcome::fail(check_id, format!("Check panicked: {}", message))
    }
  };

  if let Some(threshold) = slow_threshold
    && duration > threshold
  {
    tracing::warn!(
      check = %check_id,
      elapsed_ms = duration.as_millis() as u64,
      threshold_ms = threshold.as_millis() as u64,
      "check exceeded slow-check threshold"
    );
  }

  tracing::debug!(
    check = %check_id,
    passed = outcome.passed(),
    elapsed_ms = duration.as_millis() as u64,
    "check finished"
  );

  CheckRun { outcome, duration }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}
