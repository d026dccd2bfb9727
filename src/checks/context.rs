//! Opaque handle to the device the checks inspect

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Read-only device handle shared by every check in a run
///
/// The engine never looks inside; checks recover their platform type with
/// [`DeviceContext::downcast_ref`]. Cloning is cheap.
#[derive(Clone)]
pub struct DeviceContext {
  label: Arc<str>,
  handle: Arc<dyn Any + Send + Sync>,
}

impl DeviceContext {
  /// Wrap a platform handle
  pub fn new<T: Any + Send + Sync>(handle: T) -> Self {
    Self::labeled(std::any::type_name::<T>(), handle)
  }

  /// Wrap a platform handle with a label used in logs
  pub fn labeled<T: Any + Send + Sync>(label: impl Into<Arc<str>>, handle: T) -> Self {
    Self {
      label: label.into(),
      handle: Arc::new(handle),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  /// Borrow the platform handle if it has type `T`
  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.handle.downcast_ref::<T>()
  }
}

impl fmt::Debug for DeviceContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeviceContext").field("label", &self.label).finish_non_exhaustive()
  }
}
