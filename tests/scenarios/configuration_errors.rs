//! Test: Configuration Errors - rejected before the collaborator runs

use crate::helpers::*;
use cirun::core::{config::PipelineConfig, FailureKind, Trigger};
use cirun::execution::RunnerConfig;

/// No token: upload fails with a configuration error and is never called
#[tokio::test]
async fn test_missing_token_fails_before_upload() {
    let result = Harness::coverage()
        .run_with(COVERAGE_PIPELINE, Trigger::Push, RunnerConfig::new("."))
        .await;

    assert_run_failed_at(&result, "upload", FailureKind::Configuration);
    assert_step_failed(
        &result,
        "upload",
        FailureKind::Configuration,
        "missing required input 'token'",
    );
    assert_invoked(&result, &["checkout", "toolchain", "test"]);
}

/// An empty secret counts as missing
#[tokio::test]
async fn test_empty_token_is_missing() {
    let config = RunnerConfig::new(".").with_secret("CODECOV_TOKEN", "");
    let result = Harness::coverage()
        .run_with(COVERAGE_PIPELINE, Trigger::Push, config)
        .await;

    assert_run_failed_at(&result, "upload", FailureKind::Configuration);
    assert!(result.call("upload").is_none());
}

/// A required input left out of the step entirely
#[tokio::test]
async fn test_missing_required_input() {
    let yaml = r#"
name: "no toolchain"
steps:
  - id: toolchain
    name: "Install toolchain"
    uses: actions-rs/toolchain@v1
  - id: checkout
    name: "Checkout"
    uses: actions/checkout@v2
"#;

    let result = Harness::coverage().run(yaml).await;

    assert_run_failed_at(&result, "toolchain", FailureKind::Configuration);
    assert!(result.calls.is_empty());
    assert_step_skipped(&result, "checkout");
}

/// An action nothing is registered for
#[tokio::test]
async fn test_unknown_action() {
    let yaml = r#"
name: "unknown"
steps:
  - id: build
    name: "Build image"
    uses: docker/build-push-action@v5
"#;

    let result = Harness::coverage().run(yaml).await;

    assert_run_failed_at(&result, "build", FailureKind::Configuration);
    assert_step_failed(
        &result,
        "build",
        FailureKind::Configuration,
        "unknown action 'docker/build-push-action'",
    );
}

#[test]
fn test_invalid_pipeline_files_rejected() {
    let duplicate_ids = r#"
name: "dupes"
steps:
  - id: same
    name: "One"
    uses: checkout
  - id: same
    name: "Two"
    uses: checkout
"#;
    let err = PipelineConfig::from_yaml(duplicate_ids).unwrap_err();
    assert!(err.to_string().contains("Duplicate step ID"), "{}", err);

    let malformed_action = r#"
name: "bad uses"
steps:
  - name: "One"
    uses: "actions/checkout@"
"#;
    assert!(PipelineConfig::from_yaml(malformed_action).is_err());

    let zero_timeout = r#"
name: "zero"
steps:
  - name: "One"
    uses: checkout
    timeout_secs: 0
"#;
    assert!(PipelineConfig::from_yaml(zero_timeout).is_err());
}
