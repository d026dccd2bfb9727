//! Executor configuration and its builders
//!
//! Both executor flavors share one builder type, parameterized by a flavor
//! marker. Checks, metrics and settings are accumulated the same way for both;
//! only the async flavor carries an execution context.

use super::asynchronous::AsyncExecutor;
use super::pool::{ExecutionContext, RayonGlobal};
use super::sync::SyncExecutor;
use crate::checks::{CheckRegistry, CheckType, DeviceContext, SecurityCheck};
use crate::core::config::{ExecutionSettings, MetricsSettings, PostureConfig};
use crate::core::error::{PostureError, PostureResult};
use crate::metrics::{MetricsDispatcher, MetricsReporter};
use std::fmt;
use std::sync::Arc;

/// Immutable bundle an executor runs from
///
/// Owned by exactly one executor. The metrics thread, if any, lives as long as
/// the config and the runs started from it.
pub struct ExecutorConfig {
  device: DeviceContext,
  checks: CheckRegistry,
  metrics: MetricsDispatcher,
  settings: ExecutionSettings,
}

impl ExecutorConfig {
  pub fn device(&self) -> &DeviceContext {
    &self.device
  }

  pub fn checks(&self) -> &CheckRegistry {
    &self.checks
  }

  /// The reporter events go to; `None` when metrics are off
  pub fn metrics(&self) -> Option<&Arc<dyn MetricsReporter>> {
    self.metrics.reporter()
  }

  pub(crate) fn dispatcher(&self) -> &MetricsDispatcher {
    &self.metrics
  }

  pub fn settings(&self) -> &ExecutionSettings {
    &self.settings
  }
}

impl fmt::Debug for ExecutorConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExecutorConfig")
      .field("device", &self.device)
      .field("checks", &self.checks)
      .field("metrics", &self.metrics.is_enabled())
      .field("settings", &self.settings)
      .finish()
  }
}

/// Marker for builders that produce a [`SyncExecutor`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFlavor;

/// Marker for builders that produce an [`AsyncExecutor`]
#[derive(Clone)]
pub struct AsyncFlavor {
  context: Arc<dyn ExecutionContext>,
}

impl Default for AsyncFlavor {
  fn default() -> Self {
    Self {
      context: Arc::new(RayonGlobal),
    }
  }
}

/// Accumulates checks and options for one executor
///
/// Fallible methods take `&mut self`, so a rejected argument leaves everything
/// registered so far in place and the caller can carry on.
pub struct ExecutorBuilder<F> {
  device: DeviceContext,
  checks: CheckRegistry,
  metrics: Option<Arc<dyn MetricsReporter>>,
  settings: ExecutionSettings,
  metrics_settings: MetricsSettings,
  flavor: F,
}

/// Builder for a [`SyncExecutor`]
pub type SyncExecutorBuilder = ExecutorBuilder<SyncFlavor>;

/// Builder for an [`AsyncExecutor`]
pub type AsyncExecutorBuilder = ExecutorBuilder<AsyncFlavor>;

impl<F: Default> ExecutorBuilder<F> {
  /// Start a builder; a missing device context is rejected here, not at `build`
  pub fn new(device: impl Into<Option<DeviceContext>>) -> PostureResult<Self> {
    let device = device
      .into()
      .ok_or_else(|| PostureError::invalid_argument("device", "a device context is required"))?;

    Ok(Self {
      device,
      checks: CheckRegistry::new(),
      metrics: None,
      settings: ExecutionSettings::default(),
      metrics_settings: MetricsSettings::default(),
      flavor: F::default(),
    })
  }
}

impl<F> ExecutorBuilder<F> {
  /// Add a check; duplicates by id are ignored
  pub fn with_check<C: SecurityCheck + 'static>(&mut self, check: C) -> PostureResult<&mut Self> {
    self.with_shared_check(Arc::new(check))
  }

  /// Add a check the caller keeps a handle to
  pub fn with_shared_check(&mut self, check: Arc<dyn SecurityCheck>) -> PostureResult<&mut Self> {
    self.checks.insert(check)?;
    Ok(self)
  }

  /// Add the canonical check for a check type
  pub fn with_check_type<T: CheckType + ?Sized>(&mut self, check_type: &T) -> PostureResult<&mut Self> {
    self.checks.insert(check_type.security_check()).map_err(|err| match err {
      PostureError::InvalidArgument { reason, .. } => PostureError::invalid_argument("check_type", reason),
      other => other,
    })?;
    Ok(self)
  }

  /// Set or clear the metrics sink
  pub fn with_metrics(&mut self, reporter: Option<Arc<dyn MetricsReporter>>) -> &mut Self {
    self.metrics = reporter;
    self
  }

  /// Apply `[execution]` settings
  pub fn with_settings(&mut self, settings: ExecutionSettings) -> &mut Self {
    self.settings = settings;
    self
  }

  /// Apply `[metrics]` settings; `enabled = false` drops the reporter at `build`
  pub fn with_metrics_settings(&mut self, settings: MetricsSettings) -> &mut Self {
    self.metrics_settings = settings;
    self
  }

  /// Apply every section of a loaded posture.toml
  pub fn with_config(&mut self, config: &PostureConfig) -> &mut Self {
    self
      .with_settings(config.execution.clone())
      .with_metrics_settings(config.metrics.clone())
  }

  /// Checks registered so far
  pub fn checks(&self) -> &CheckRegistry {
    &self.checks
  }

  fn into_config(self) -> (ExecutorConfig, F) {
    let reporter = if self.metrics_settings.enabled {
      self.metrics
    } else {
      if self.metrics.is_some() {
        tracing::debug!("metrics disabled by settings, dropping configured reporter");
      }
      None
    };

    let config = ExecutorConfig {
      device: self.device,
      checks: self.checks,
      metrics: MetricsDispatcher::new(reporter),
      settings: self.settings,
    };
    (config, self.flavor)
  }
}

impl ExecutorBuilder<SyncFlavor> {
  pub fn build(self) -> SyncExecutor {
    let (config, _) = self.into_config();
    SyncExecutor::new(config)
  }
}

impl ExecutorBuilder<AsyncFlavor> {
  /// Run checks on this pool instead of rayon's global one
  pub fn with_execution_context(&mut self, context: Arc<dyn ExecutionContext>) -> &mut Self {
    self.flavor.context = context;
    self
  }

  pub fn build(self) -> AsyncExecutor {
    let (config, flavor) = self.into_config();
    AsyncExecutor::new(config, flavor.context)
  }
}
