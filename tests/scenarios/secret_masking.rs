//! Test: Secret Masking - secret values never reach the log or report

use crate::helpers::*;
use cirun::core::{FailureKind, Trigger};
use cirun::execution::RunnerConfig;

const SECRET: &str = "s3cr3t-t0ken";

const ECHO_PIPELINE: &str = r#"
name: "echo"
steps:
  - id: echo
    name: "Echo"
    uses: echo
    with:
      token: "${{ secrets.CODECOV_TOKEN }}"
      file: lcov.info
"#;

#[tokio::test]
async fn test_secret_masked_in_log_and_report() {
    let config = RunnerConfig::new(".").with_secret("CODECOV_TOKEN", SECRET);
    let result = Harness::new()
        .with("echo", Behavior::EchoInputs)
        .run_with(ECHO_PIPELINE, Trigger::Push, config)
        .await;

    assert_run_succeeded(&result);

    // the collaborator got the real value
    assert_eq!(result.call("echo").unwrap().inputs["token"], SECRET);

    assert!(result.log_text().contains("token=***"));
    assert!(!result.log_text().contains(SECRET));
    assert_step_succeeded(&result, "echo", "token=***");
    assert!(!result.report.to_json().unwrap().contains(SECRET));
}

#[tokio::test]
async fn test_secret_masked_in_failure() {
    let config = RunnerConfig::new(".").with_secret("CODECOV_TOKEN", SECRET);
    let result = Harness::new()
        .with("echo", Behavior::Fail(format!("bad credentials {}", SECRET)))
        .run_with(ECHO_PIPELINE, Trigger::Push, config)
        .await;

    assert_run_failed_at(&result, "echo", FailureKind::Execution);
    let failure = result.report.failure.as_ref().unwrap();
    assert!(failure.message.contains("bad credentials ***"));
    assert!(!result.report.to_json().unwrap().contains(SECRET));
}
