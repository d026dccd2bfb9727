//! Integration tests for the blocking executor

use crate::helpers::{ErroringCheck, PanickingCheck, Probe, StaticCheck, device};
use posture_guard::{PostureResult, SecurityCheckExecutor};
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[test]
fn test_three_checks_all_pass() -> PostureResult<()> {
  let mut builder = SecurityCheckExecutor::sync_builder(device())?;
  builder
    .with_check(StaticCheck::passing("rooted"))?
    .with_check(StaticCheck::passing("debugger"))?
    .with_check(StaticCheck::passing("emulator"))?;

  let result = builder.build().execute();

  assert!(result.passed());
  assert_eq!(result.len(), 3);
  assert!(result.outcomes().values().all(|o| o.passed()));
  Ok(())
}

#[test]
fn test_three_checks_one_fails() -> PostureResult<()> {
  let mut builder = SecurityCheckExecutor::sync_builder(device())?;
  builder
    .with_check(StaticCheck::passing("rooted"))?
    .with_check(StaticCheck::failing("debugger"))?
    .with_check(StaticCheck::passing("emulator"))?;

  let result = builder.build().execute();

  assert!(!result.passed());
  assert_eq!(result.len(), 3);
  let failed = result.failed();
  assert_eq!(failed.len(), 1);
  assert_eq!(failed[0].check_id(), "debugger");
  assert_eq!(failed[0].detail(), Some("debugger detected"));
  Ok(())
}

#[test]
fn test_no_checks_is_vacuous_pass() -> PostureResult<()> {
  let result = SecurityCheckExecutor::sync_builder(device())?.build().execute();
  assert!(result.passed());
  assert!(result.is_empty());
  Ok(())
}

#[test]
fn test_same_instance_and_type_registered_once() -> PostureResult<()> {
  let check = Arc::new(StaticCheck::passing("tamper"));
  let runs = check.run_count();

  let mut builder = SecurityCheckExecutor::sync_builder(device())?;
  builder
    .with_shared_check(check.clone())?
    .with_shared_check(check)?
    .with_check_type(&Probe::Rooted)?
    .with_check_type(&Probe::Rooted)?;

  let result = builder.build().execute();

  assert_eq!(result.len(), 2);
  assert_eq!(runs.load(Ordering::SeqCst), 1);
  assert_eq!(result.outcome("rooted").unwrap().detail(), Some("no root indicators"));
  Ok(())
}

#[test]
fn test_failures_are_isolated() -> PostureResult<()> {
  let sibling = StaticCheck::passing("emulator");
  let sibling_runs = sibling.run_count();

  let mut builder = SecurityCheckExecutor::sync_builder(device())?;
  builder
    .with_check(ErroringCheck("debugger"))?
    .with_check(PanickingCheck("tamper"))?
    .with_check(sibling)?;

  let result = builder.build().execute();

  assert!(!result.passed());
  assert_eq!(result.len(), 3);
  assert_eq!(sibling_runs.load(Ordering::SeqCst), 1);
  assert!(result.outcome("emulator").unwrap().passed());

  let debugger = result.outcome("debugger").unwrap();
  assert!(!debugger.passed());
  assert!(debugger.detail().unwrap().contains("permission denied"));

  let tamper = result.outcome("tamper").unwrap();
  assert!(!tamper.passed());
  assert!(tamper.detail().unwrap().contains("probe crashed"));
  Ok(())
}

#[test]
fn test_result_serializes_to_json() -> PostureResult<()> {
  let mut builder = SecurityCheckExecutor::sync_builder(device())?;
  builder.with_check_type(&Probe::Rooted)?.with_check(StaticCheck::failing("emulator"))?;

  let json: serde_json::Value = serde_json::from_str(&builder.build().execute().to_json()?)?;

  assert_eq!(json["passed"], false);
  assert_eq!(json["outcomes"]["rooted"]["passed"], true);
  assert_eq!(json["outcomes"]["emulator"]["detail"], "emulator detected");
  Ok(())
}
