//! Deduplicated set of checks keyed by id

use super::trait_def::SecurityCheck;
use crate::core::error::{PostureError, PostureResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Registry of checks, unique by `SecurityCheck::id`
///
/// Iteration is sorted by id, which gives every run the same order. The order
/// carries no meaning for aggregation.
#[derive(Clone, Default)]
pub struct CheckRegistry {
  checks: BTreeMap<String, Arc<dyn SecurityCheck>>,
}

impl CheckRegistry {
  /// Create an empty registry
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a check
  ///
  /// Returns `Ok(false)` when a check with the same id is already present; the
  /// first registration wins. Blank ids are rejected.
  pub fn insert(&mut self, check: Arc<dyn SecurityCheck>) -> PostureResult<bool> {
    let id = check.id().trim().to_string();
    if id.is_empty() {
      return Err(PostureError::invalid_argument("check", "check id must not be empty"));
    }

    if self.checks.contains_key(&id) {
      tracing::debug!(check = %id, "check already registered, ignoring duplicate");
      return Ok(false);
    }

    tracing::debug!(check = %id, name = %check.name(), "registered check");
    self.checks.insert(id, check);
    Ok(true)
  }

  pub fn len(&self) -> usize {
    self.checks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.checks.is_empty()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.checks.contains_key(id)
  }

  /// Registered ids in iteration order
  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.checks.keys().map(String::as_str)
  }

  /// `(registered id, check)` pairs in iteration order
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn SecurityCheck>)> {
    self.checks.iter().map(|(id, check)| (id.as_str(), check))
  }
}

impl fmt::Debug for CheckRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.checks.keys()).finish()
  }
}
