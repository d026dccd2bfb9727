//! Ambient plumbing for posture-guard
//!
//! - **config**: posture.toml parsing and validation
//! - **error**: error types with contextual help messages

pub mod config;
pub mod error;
