//! Worker pools the async executor submits checks to
//!
//! The embedding application owns the pool and hands it to the builder. Three
//! flavors ship here: rayon's global pool, any `rayon::ThreadPool`, and
//! `ExecutionPool`, an owned rayon pool that can be shut down.

use crate::core::config::ExecutionSettings;
use crate::core::error::{PostureError, PostureResult};
use std::sync::{Arc, PoisonError, RwLock};

/// A unit of work submitted to an execution context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run jobs concurrently
///
/// `spawn` must not run the job inline on the caller's thread. Returning an error
/// means the job was not and will not be run.
pub trait ExecutionContext: Send + Sync {
  fn spawn(&self, job: Job) -> PostureResult<()>;
}

/// rayon's global thread pool
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonGlobal;

impl ExecutionContext for RayonGlobal {
  fn spawn(&self, job: Job) -> PostureResult<()> {
    rayon::spawn(job);
    Ok(())
  }
}

impl ExecutionContext for rayon::ThreadPool {
  fn spawn(&self, job: Job) -> PostureResult<()> {
    rayon::ThreadPool::spawn(self, job);
    Ok(())
  }
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for Arc<T> {
  fn spawn(&self, job: Job) -> PostureResult<()> {
    (**self).spawn(job)
  }
}

/// Owned rayon pool with an explicit shutdown
///
/// After `shutdown`, every `spawn` fails with a coordination error. Jobs already
/// queued still run to completion on the old workers.
pub struct ExecutionPool {
  pool: RwLock<Option<Arc<rayon::ThreadPool>>>,
  threads: usize,
}

impl ExecutionPool {
  /// Build a pool; `None` lets rayon pick the thread count
  pub fn new(threads: Option<usize>) -> PostureResult<Self> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(threads.unwrap_or(0))
      .thread_name(|i| format!("posture-worker-{}", i))
      .build()?;
    let threads = pool.current_num_threads();

    tracing::debug!(threads, "execution pool started");
    Ok(Self {
      pool: RwLock::new(Some(Arc::new(pool))),
      threads,
    })
  }

  /// Build a pool sized by `[execution] worker_threads`
  pub fn from_settings(settings: &ExecutionSettings) -> PostureResult<Self> {
    settings.validate()?;
    Self::new(settings.worker_threads)
  }

  pub fn threads(&self) -> usize {
    self.threads
  }

  pub fn is_running(&self) -> bool {
    self.pool.read().unwrap_or_else(PoisonError::into_inner).is_some()
  }

  /// Refuse new jobs and release the workers once queued jobs finish
  pub fn shutdown(&self) {
    let previous = self.pool.write().unwrap_or_else(PoisonError::into_inner).take();
    if previous.is_some() {
      tracing::debug!(threads = self.threads, "execution pool shut down");
    }
  }
}

impl ExecutionContext for ExecutionPool {
  fn spawn(&self, job: Job) -> PostureResult<()> {
    let guard = self.pool.read().unwrap_or_else(PoisonError::into_inner);
    match guard.as_ref() {
      Some(pool) => {
        rayon::ThreadPool::spawn(pool, job);
        Ok(())
      }
      None => Err(PostureError::coordination("execution pool has been shut down")),
    }
  }
}
