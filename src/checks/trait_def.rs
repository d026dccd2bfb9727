//! Check trait abstraction for device posture probes
//!
//! Every probe (root detection, debugger attachment, tamper detection, ...)
//! implements `SecurityCheck`. The engine only ever sees `Arc<dyn SecurityCheck>`,
//! so concrete probes live with whoever embeds the engine.

use super::context::DeviceContext;
use crate::core::error::PostureResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of running one check once
///
/// Fields are private so an outcome cannot be edited after the check hands it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
  check_id: String,
  passed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  detail: Option<String>,
}

impl CheckOutcome {
  /// Create a passing outcome
  pub fn pass(check_id: impl Into<String>) -> Self {
    Self {
      check_id: check_id.into(),
      passed: true,
      detail: None,
    }
  }

  /// Create a failing outcome
  pub fn fail(check_id: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      check_id: check_id.into(),
      passed: false,
      detail: Some(detail.into()),
    }
  }

  /// Attach a human-readable detail
  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }

  pub fn check_id(&self) -> &str {
    &self.check_id
  }

  pub fn passed(&self) -> bool {
    self.passed
  }

  pub fn detail(&self) -> Option<&str> {
    self.detail.as_deref()
  }

  /// Re-key an outcome under the id it was registered with
  pub(crate) fn rekeyed(mut self, check_id: &str) -> Self {
    if self.check_id != check_id {
      tracing::debug!(
        reported = %self.check_id,
        registered = %check_id,
        "check reported a foreign id; using the registered one"
      );
      self.check_id = check_id.to_string();
    }
    self
  }
}

/// Device posture check
///
/// Implementations must be safe to run concurrently with other checks. The
/// engine calls `execute` at most once per run and never retries.
///
/// # Example
///
/// ```rust,ignore
/// use posture_guard::{CheckOutcome, DeviceContext, PostureResult, SecurityCheck};
///
/// struct DebuggerCheck;
///
/// impl SecurityCheck for DebuggerCheck {
///   fn id(&self) -> &str {
///     "debugger-attached"
///   }
///
///   fn execute(&self, device: &DeviceContext) -> PostureResult<CheckOutcome> {
///     let platform = device.downcast_ref::<MyPlatform>().ok_or("not my platform")?;
///     if platform.tracer_pid()? == 0 {
///       Ok(CheckOutcome::pass(self.id()))
///     } else {
///       Ok(CheckOutcome::fail(self.id(), "a tracer is attached"))
///     }
///   }
/// }
/// ```
pub trait SecurityCheck: Send + Sync {
  /// Stable identity used for deduplication and as the result key
  fn id(&self) -> &str;

  /// Human-readable name (defaults to the id)
  fn name(&self) -> &str {
    self.id()
  }

  /// Probe the device
  fn execute(&self, device: &DeviceContext) -> PostureResult<CheckOutcome>;
}

/// A kind of check that resolves to its canonical instance
///
/// Embedders usually implement this on their own enum of probe kinds.
pub trait CheckType {
  fn security_check(&self) -> Arc<dyn SecurityCheck>;
}

impl<T: SecurityCheck + ?Sized> SecurityCheck for Arc<T> {
  fn id(&self) -> &str {
    (**self).id()
  }

  fn name(&self) -> &str {
    (**self).name()
  }

  fn execute(&self, device: &DeviceContext) -> PostureResult<CheckOutcome> {
    (**self).execute(device)
  }
}
