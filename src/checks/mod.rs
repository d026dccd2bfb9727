//! Check abstraction, device handle and registry
//!
//! All probes implement the `SecurityCheck` trait. The engine treats them as
//! opaque units of work: it registers them by id, runs each once per execution
//! and converts any error or panic into a failing outcome.
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_guard::checks::{CheckRegistry, DeviceContext, run_check};
//!
//! let mut registry = CheckRegistry::new();
//! registry.insert(Arc::new(RootedCheck::default()))?;
//!
//! let device = DeviceContext::new(platform_handle);
//! for (id, check) in registry.iter() {
//!   let run = run_check(id, check.as_ref(), &device, None);
//!   println!("{}: {}", id, run.outcome.passed());
//! }
//! ```

mod context;
mod registry;
mod runner;
mod trait_def;

pub use context::DeviceContext;
pub use registry::CheckRegistry;
pub use runner::{CheckRun, run_check};
pub use trait_def::{CheckOutcome, CheckType, SecurityCheck};

pub(crate) use runner::panic_message;
