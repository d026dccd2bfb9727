//! Device security-posture checks with a deterministic aggregate verdict
//!
//! Register independent probes (root detection, debugger attachment, tamper
//! detection, ...) on a builder, then run them either on the caller's thread
//! ([`SyncExecutor`]) or on a worker pool with callback delivery
//! ([`AsyncExecutor`]). Both produce the same [`ExecutionResult`]: one outcome per
//! registered check and a verdict that passes only if every check passed.
//!
//! A check that errors or panics fails on its own without affecting the others.
//! Metrics go to an optional [`MetricsReporter`] on a best-effort basis.

pub mod checks;
pub mod core;
pub mod executor;
pub mod metrics;

pub use crate::checks::{CheckOutcome, CheckRegistry, CheckType, DeviceContext, SecurityCheck};
pub use crate::core::config::{ExecutionSettings, MetricsSettings, PostureConfig};
pub use crate::core::error::{PostureError, PostureResult};
pub use crate::executor::{
  AsyncExecutor, AsyncExecutorBuilder, ExecutionContext, ExecutionHandle, ExecutionPool, ExecutionResult,
  ExecutionState, SecurityCheckExecutor, SyncExecutor, SyncExecutorBuilder,
};
pub use crate::metrics::{CheckEvent, ExecutionEvent, MetricsReporter};
