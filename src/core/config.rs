use crate::core::error::{ConfigError, PostureError, PostureResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for posture-guard
/// Searched in order: posture.toml, .posture.toml, .config/posture.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureConfig {
  #[serde(default)]
  pub execution: ExecutionSettings,
  #[serde(default)]
  pub metrics: MetricsSettings,
}

/// Knobs that shape a single run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
  /// Log a warning when a check runs longer than this (milliseconds)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slow_check_threshold_ms: Option<u64>,

  /// Size of an `ExecutionPool` built from these settings (default: rayon's choice)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub worker_threads: Option<usize>,
}

/// `[metrics]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
  /// Drop any configured metrics sink when false (default: true)
  #[serde(default = "default_metrics_enabled")]
  pub enabled: bool,
}

fn default_metrics_enabled() -> bool {
  true
}

impl Default for MetricsSettings {
  fn default() -> Self {
    Self {
      enabled: default_metrics_enabled(),
    }
  }
}

impl ExecutionSettings {
  /// Slow-check threshold as a `Duration`
  pub fn slow_check_threshold(&self) -> Option<Duration> {
    self.slow_check_threshold_ms.map(Duration::from_millis)
  }

  /// Set the slow-check threshold
  pub fn with_slow_check_threshold(mut self, threshold: Duration) -> Self {
    self.slow_check_threshold_ms = Some(threshold.as_millis() as u64);
    self
  }

  /// Validate execution settings
  pub fn validate(&self) -> PostureResult<()> {
    if self.worker_threads == Some(0) {
      return Err(PostureError::Config(ConfigError::Invalid {
        field: "execution.worker_threads".to_string(),
        reason: "must be at least 1".to_string(),
      }));
    }

    if self.slow_check_threshold_ms == Some(0) {
      return Err(PostureError::Config(ConfigError::Invalid {
        field: "execution.slow_check_threshold_ms".to_string(),
        reason: "must be at least 1 millisecond".to_string(),
      }));
    }

    Ok(())
  }
}

impl PostureConfig {
  /// Find config file in search order: posture.toml, .posture.toml, .config/posture.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("posture.toml"),
      path.join(".posture.toml"),
      path.join(".config").join("posture.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from posture.toml (searches multiple locations)
  pub fn load(path: &Path) -> PostureResult<Self> {
    let config_path = Self::find_config_path(path)
      .ok_or_else(|| PostureError::Config(ConfigError::NotFound { root: path.to_path_buf() }))?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Invalid config in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded posture config");
    Ok(config)
  }

  /// Parse and validate config from TOML text
  pub fn parse(content: &str) -> PostureResult<Self> {
    let config: PostureConfig = toml_edit::de::from_str(content)?;
    config.execution.validate()?;
    Ok(config)
  }

  /// Save config to posture.toml (default location)
  pub fn save(&self, path: &Path) -> PostureResult<()> {
    let config_path = path.join("posture.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }
}
