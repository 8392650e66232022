//! Test: Timeouts - a step past its limit fails with a timeout error

use crate::helpers::*;
use cirun::core::{FailureKind, Trigger};
use cirun::execution::RunnerConfig;
use std::time::{Duration, Instant};

/// The test step's `timeout` input bounds it; upload is skipped
#[tokio::test]
async fn test_test_step_timeout() {
    let yaml = COVERAGE_PIPELINE.replace("timeout: 60", "timeout: 1");
    let config = RunnerConfig::new(".").with_secret("CODECOV_TOKEN", "abc123");

    let started = Instant::now();
    let result = Harness::coverage()
        .with_mock("actions-rs/tarpaulin", |calls| {
            MockCollaborator::new(calls, Behavior::Sleep(Duration::from_secs(30))).with_input_timeout()
        })
        .run_with(&yaml, Trigger::Push, config)
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_run_failed_at(&result, "test", FailureKind::Timeout);
    assert_step_failed(&result, "test", FailureKind::Timeout, "timeout after 1 seconds");
    assert_step_skipped(&result, "upload");
    assert!(result.call("upload").is_none());
}

/// `timeout_secs` on the step applies to any collaborator
#[tokio::test]
async fn test_step_timeout_secs() {
    let yaml = r#"
name: "slow checkout"
steps:
  - id: checkout
    name: "Checkout"
    uses: checkout
    timeout_secs: 1
"#;

    let result = Harness::new()
        .with("checkout", Behavior::Sleep(Duration::from_secs(30)))
        .run(yaml)
        .await;

    assert_run_failed_at(&result, "checkout", FailureKind::Timeout);
}

/// A timeout on a continue-on-error step is tolerated
#[tokio::test]
async fn test_tolerated_timeout() {
    let yaml = r#"
name: "slow but optional"
steps:
  - id: slow
    name: "Slow"
    uses: slow
    timeout_secs: 1
    continue_on_error: true
  - id: fast
    name: "Fast"
    uses: fast
"#;

    let result = Harness::new()
        .with("slow", Behavior::Sleep(Duration::from_secs(30)))
        .with("fast", Behavior::Succeed("done".into()))
        .run(yaml)
        .await;

    assert_run_succeeded(&result);
    assert_step_failed(&result, "slow", FailureKind::Timeout, "timeout");
    assert_step_succeeded(&result, "fast", "done");
}
