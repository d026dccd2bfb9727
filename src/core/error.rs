//! Error types for posture-guard with contextual messages
//!
//! One error enum covers the whole engine. Configuration mistakes surface at the
//! builder call that made them, check failures are folded into failing outcomes
//! before they ever reach this type's callers, and coordination faults are the
//! only errors an async run can deliver through its callback.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for posture-guard
#[derive(Debug)]
pub enum PostureError {
  /// A builder argument violated its contract
  InvalidArgument { argument: &'static str, reason: String },

  /// A check failed while probing the device
  Check { check_id: String, message: String },

  /// The async execution substrate could not run the batch
  Coordination { message: String },

  /// Settings file errors
  Config(ConfigError),

  /// A metrics reporter rejected an event
  Metrics { message: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl PostureError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    PostureError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Reject a builder argument
  pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
    PostureError::InvalidArgument {
      argument,
      reason: reason.into(),
    }
  }

  /// Failure raised from inside a check
  pub fn check(check_id: impl Into<String>, message: impl Into<String>) -> Self {
    PostureError::Check {
      check_id: check_id.into(),
      message: message.into(),
    }
  }

  /// Failure of the worker pool or scheduling layer
  pub fn coordination(message: impl Into<String>) -> Self {
    PostureError::Coordination {
      message: message.into(),
    }
  }

  /// Failure reported by a metrics sink
  pub fn metrics(message: impl Into<String>) -> Self {
    PostureError::Metrics {
      message: message.into(),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      PostureError::Message { message, context, help } => PostureError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      PostureError::Io(err) => PostureError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      PostureError::Config(err) => PostureError::Message {
        message: err.to_string(),
        context: Some(ctx_str),
        help: err.help_message(),
      },
      _ => self,
    }
  }

  /// Whether this error is a builder contract violation
  pub fn is_invalid_argument(&self) -> bool {
    matches!(self, PostureError::InvalidArgument { .. })
  }

  /// Whether this error came from the async execution substrate
  pub fn is_coordination(&self) -> bool {
    matches!(self, PostureError::Coordination { .. })
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      PostureError::InvalidArgument { argument, .. } => Some(format!(
        "Pass a valid `{}` to the executor builder; the builder itself is still usable.",
        argument
      )),
      PostureError::Coordination { .. } => {
        Some("Make sure the execution pool is alive for as long as runs are submitted to it.".to_string())
      }
      PostureError::Config(e) => e.help_message(),
      PostureError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for PostureError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PostureError::InvalidArgument { argument, reason } => {
        write!(f, "Invalid argument `{}`: {}", argument, reason)
      }
      PostureError::Check { check_id, message } => write!(f, "Check '{}' failed: {}", check_id, message),
      PostureError::Coordination { message } => write!(f, "Execution coordination failed: {}", message),
      PostureError::Config(e) => write!(f, "{}", e),
      PostureError::Metrics { message } => write!(f, "Metrics reporting failed: {}", message),
      PostureError::Io(e) => write!(f, "I/O error: {}", e),
      PostureError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for PostureError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PostureError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for PostureError {
  fn from(err: io::Error) -> Self {
    PostureError::Io(err)
  }
}

impl From<String> for PostureError {
  fn from(msg: String) -> Self {
    PostureError::message(msg)
  }
}

impl From<&str> for PostureError {
  fn from(msg: &str) -> Self {
    PostureError::message(msg)
  }
}

impl From<toml_edit::de::Error> for PostureError {
  fn from(err: toml_edit::de::Error) -> Self {
    PostureError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for PostureError {
  fn from(err: toml_edit::ser::Error) -> Self {
    PostureError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for PostureError {
  fn from(err: serde_json::Error) -> Self {
    PostureError::message(format!("JSON error: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for PostureError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    PostureError::coordination(format!("failed to build worker pool: {}", err))
  }
}

/// Convert anyhow::Error so check implementations can use `?` on anything
impl From<anyhow::Error> for PostureError {
  fn from(err: anyhow::Error) -> Self {
    PostureError::message(format!("{:#}", err))
  }
}

/// Settings file errors
#[derive(Debug)]
pub enum ConfigError {
  /// posture.toml not found
  NotFound { root: PathBuf },

  /// A field holds a value outside its allowed range
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create posture.toml or fall back to `ExecutionSettings::default()`.".to_string())
      }
      ConfigError::Invalid { field, .. } => Some(format!("Fix `{}` in posture.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { root } => {
        write!(
          f,
          "No posture-guard configuration found.\nExpected file: {}/posture.toml",
          root.display()
        )
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid value for `{}`: {}", field, reason)
      }
    }
  }
}

/// Result type alias for posture-guard
pub type PostureResult<T> = Result<T, PostureError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> PostureResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> PostureResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<PostureError>,
{
  fn context(self, ctx: impl Into<String>) -> PostureResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> PostureResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}
