//! Test: Failure Handling - the first hard failure aborts the run

use crate::helpers::*;
use cirun::core::{FailureKind, StepState, Trigger};
use cirun::execution::RunnerConfig;

fn token() -> RunnerConfig {
    RunnerConfig::new(".").with_secret("CODECOV_TOKEN", "abc123")
}

/// A failing test step stops the run before upload
#[tokio::test]
async fn test_failing_tests_skip_upload() {
    let result = Harness::coverage()
        .with_mock("actions-rs/tarpaulin", |calls| {
            MockCollaborator::new(calls, Behavior::Fail("3 tests failed".into())).with_input_timeout()
        })
        .run_with(COVERAGE_PIPELINE, Trigger::Push, token())
        .await;

    assert_run_failed_at(&result, "test", FailureKind::Execution);
    assert_step_failed(&result, "test", FailureKind::Execution, "3 tests failed");
    assert_step_skipped(&result, "upload");
    assert_invoked(&result, &["checkout", "toolchain", "test"]);
    assert!(result.call("upload").is_none(), "upload must never be invoked");
}

/// What the failing tool printed ends up in the step's log
#[tokio::test]
async fn test_failing_tool_output_is_logged() {
    let result = Harness::coverage()
        .with(
            "actions-rs/tarpaulin",
            Behavior::ExitWith {
                code: 101,
                stdout: "running 2 tests\ntest parser::empty ... FAILED\n".into(),
            },
        )
        .run_with(COVERAGE_PIPELINE, Trigger::Push, token())
        .await;

    assert_run_failed_at(&result, "test", FailureKind::Execution);
    assert_step_failed(&result, "test", FailureKind::Execution, "exited with code 101");

    let lines: Vec<&str> = result.report.log.lines_for("test").collect();
    let failed_at = lines
        .iter()
        .position(|l| *l == "test parser::empty ... FAILED")
        .expect("tool output missing from the log");
    let summary_at = lines.iter().position(|l| l.starts_with("Failed:")).unwrap();
    assert!(failed_at < summary_at, "{:?}", lines);
    assert_step_skipped(&result, "upload");
}

/// A failure in the first step skips everything after it
#[tokio::test]
async fn test_first_step_failure_skips_rest() {
    let result = Harness::coverage()
        .with("actions/checkout", Behavior::Fail("repository not found".into()))
        .run_with(COVERAGE_PIPELINE, Trigger::Push, token())
        .await;

    assert_run_failed_at(&result, "checkout", FailureKind::Execution);
    assert_invoked(&result, &["checkout"]);
    for id in ["toolchain", "test", "upload"] {
        assert_step_skipped(&result, id);
        match result.step_state(id) {
            StepState::Skipped { reason } => assert!(reason.contains("checkout")),
            other => panic!("unexpected state {:?}", other),
        }
    }
}

/// The report carries the failure and every step's state
#[tokio::test]
async fn test_report_names_failed_step() {
    let result = Harness::coverage()
        .with("actions-rs/toolchain", Behavior::Fail("toolchain 'nightly' not found".into()))
        .run_with(COVERAGE_PIPELINE, Trigger::Push, token())
        .await;

    let failure = result.report.failure.as_ref().unwrap();
    assert_eq!(failure.step, "toolchain");
    assert!(failure.message.contains("not found"));
    assert!(failure.to_string().starts_with("step 'toolchain' failed"));

    let labels: Vec<&str> = result.report.steps.iter().map(|s| s.state.label()).collect();
    assert_eq!(labels, vec!["succeeded", "failed", "skipped", "skipped"]);

    let json: serde_json::Value = serde_json::from_str(&result.report.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["failure"]["step"], "toolchain");
    assert_eq!(json["failure"]["kind"], "execution");
}
