//! Check orchestration: configuration, executors and aggregation
//!
//! - **builder**: `ExecutorConfig` and the per-flavor builders
//! - **sync**: blocking executor, checks run on the caller's thread
//! - **asynchronous**: checks fan out to an `ExecutionContext`, verdict comes back via callback
//! - **pool**: execution contexts backed by rayon
//! - **result**: `ExecutionResult` and the aggregators both executors share
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_guard::{DeviceContext, SecurityCheckExecutor};
//!
//! let mut builder = SecurityCheckExecutor::sync_builder(DeviceContext::new(platform))?;
//! builder
//!   .with_check_type(&Probe::Rooted)?
//!   .with_check_type(&Probe::DebuggerAttached)?
//!   .with_metrics(Some(reporter));
//!
//! let result = builder.build().execute();
//! if !result.passed() {
//!   for outcome in result.failed() {
//!     eprintln!("{}: {}", outcome.check_id(), outcome.detail().unwrap_or("failed"));
//!   }
//! }
//! ```

mod asynchronous;
mod builder;
mod pool;
mod result;
mod sync;

pub use asynchronous::{AsyncExecutor, ExecutionCallback, ExecutionHandle, ExecutionState};
pub use builder::{
  AsyncExecutorBuilder, AsyncFlavor, ExecutorBuilder, ExecutorConfig, SyncExecutorBuilder, SyncFlavor,
};
pub use pool::{ExecutionContext, ExecutionPool, Job, RayonGlobal};
pub use result::{ExecutionResult, ResultAggregator, SharedAggregator};
pub use sync::SyncExecutor;

use crate::checks::DeviceContext;
use crate::core::error::PostureResult;

/// Entry points for executor builders
pub enum SecurityCheckExecutor {}

impl SecurityCheckExecutor {
  /// Builder for an executor that blocks the caller until every check has run
  ///
  /// Fails with `InvalidArgument` when no device context is given.
  pub fn sync_builder(device: impl Into<Option<DeviceContext>>) -> PostureResult<SyncExecutorBuilder> {
    SyncExecutorBuilder::new(device)
  }

  /// Builder for an executor that runs checks on a worker pool
  ///
  /// Fails with `InvalidArgument` when no device context is given.
  pub fn async_builder(device: impl Into<Option<DeviceContext>>) -> PostureResult<AsyncExecutorBuilder> {
    AsyncExecutorBuilder::new(device)
  }
}
