//! Test utility functions for cirun scenarios

#![allow(dead_code)]

use async_trait::async_trait;
use cirun::collaborator::{
    subprocess::CommandFailure, Collaborator, CollaboratorOutput, CollaboratorRegistry,
    Invocation, StepError, StepInputs,
};
use cirun::core::{config::PipelineConfig, FailureKind, Pipeline, Run, StepState, Trigger};
use cirun::execution::{ExecutionEvent, RunReport, Runner, RunnerConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The four-step coverage pipeline used by most scenarios
pub const COVERAGE_PIPELINE: &str = r#"
name: "coverage"
on: [push, pull_request]
variables:
  toolchain: nightly
steps:
  - id: checkout
    name: "Checkout"
    uses: actions/checkout@v2
  - id: toolchain
    name: "Install toolchain"
    uses: actions-rs/toolchain@v1
    with:
      toolchain: "{{ toolchain }}"
      override: true
  - id: test
    name: "Run tests with coverage"
    uses: actions-rs/tarpaulin@v0.1
    with:
      timeout: 60
      args: "--ignore-tests"
  - id: upload
    name: "Upload coverage"
    uses: codecov/codecov-action@v1
    with:
      token: "${{ secrets.CODECOV_TOKEN }}"
      file: lcov.info
"#;

/// One recorded collaborator call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub step_id: String,
    pub action: String,
    pub inputs: StepInputs,
}

pub type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

/// What a mock collaborator does when called
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed(String),
    Fail(String),
    /// Exit with `code` after printing `stdout`, like a failing tool
    ExitWith { code: i32, stdout: String },
    /// Print every input as `key=value`
    EchoInputs,
    Sleep(Duration),
}

/// Mock collaborator that records its calls
pub struct MockCollaborator {
    calls: CallLog,
    behavior: Behavior,
    required: &'static [&'static str],
    timeout_from_input: bool,
}

impl MockCollaborator {
    pub fn new(calls: CallLog, behavior: Behavior) -> Self {
        Self {
            calls,
            behavior,
            required: &[],
            timeout_from_input: false,
        }
    }

    pub fn requiring(mut self, inputs: &'static [&'static str]) -> Self {
        self.required = inputs;
        self
    }

    /// Take the collaborator timeout from the `timeout` input, in seconds
    pub fn with_input_timeout(mut self) -> Self {
        self.timeout_from_input = true;
        self
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    fn required_inputs(&self) -> &'static [&'static str] {
        self.required
    }

    fn timeout(&self, inputs: &StepInputs) -> Option<Duration> {
        if !self.timeout_from_input {
            return None;
        }
        inputs
            .get("timeout")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
    }

    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError> {
        self.calls.lock().unwrap().push(RecordedCall {
            step_id: invocation.step_id.to_string(),
            action: invocation.action.to_string(),
            inputs: invocation.inputs.clone(),
        });

        match &self.behavior {
            Behavior::Succeed(output) => Ok(CollaboratorOutput::new(output.clone())),
            Behavior::Fail(message) => Err(StepError::Execution(message.clone())),
            Behavior::ExitWith { code, stdout } => Err(StepError::Command(CommandFailure {
                command: invocation.action.name.clone(),
                exit_code: *code,
                stdout: stdout.clone(),
                stderr: String::new(),
            })),
            Behavior::EchoInputs => Ok(CollaboratorOutput::new(
                invocation
                    .inputs
                    .iter()
                    .map(|(k, v)| format!("{}={}\n", k, v))
                    .collect::<String>(),
            )),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(CollaboratorOutput::new("woke up"))
            }
        }
    }
}

/// Registry of mock collaborators sharing one call log
pub struct Harness {
    registry: CollaboratorRegistry,
    calls: CallLog,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            registry: CollaboratorRegistry::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Harness with mocks for the coverage pipeline that all succeed
    pub fn coverage() -> Self {
        Self::new()
            .with("actions/checkout", Behavior::Succeed("3f2c1a9".into()))
            .with_mock(
                "actions-rs/toolchain",
                |calls| MockCollaborator::new(calls, Behavior::Succeed("nightly".into())).requiring(&["toolchain"]),
            )
            .with_mock("actions-rs/tarpaulin", |calls| {
                MockCollaborator::new(calls, Behavior::Succeed("85.00% coverage".into()))
                    .with_input_timeout()
            })
            .with_mock("codecov/codecov-action", |calls| {
                MockCollaborator::new(calls, Behavior::Succeed("uploaded".into()))
                    .requiring(&["token", "file"])
            })
    }

    pub fn with(self, action: &str, behavior: Behavior) -> Self {
        self.with_mock(action, |calls| MockCollaborator::new(calls, behavior))
    }

    /// Replace the collaborator for `action`
    pub fn with_mock<F>(mut self, action: &str, build: F) -> Self
    where
        F: FnOnce(CallLog) -> MockCollaborator,
    {
        let mock = build(self.calls.clone());
        self.registry.register(action, mock);
        self
    }

    pub async fn run(&self, yaml: &str) -> RunTestResult {
        self.run_with(yaml, Trigger::Push, RunnerConfig::new(".")).await
    }

    pub async fn run_with(&self, yaml: &str, trigger: Trigger, config: RunnerConfig) -> RunTestResult {
        let pipeline = pipeline_from_yaml(yaml);
        let mut run = pipeline.create_run(trigger);

        let runner = Runner::new(self.registry.clone(), config);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        runner
            .add_event_handler(move |event| sink.lock().unwrap().push(event))
            .await;

        let report = runner
            .execute(&mut run)
            .await
            .unwrap_or_else(|e| panic!("Run could not start: {}", e));

        let events = events.lock().unwrap().clone();
        RunTestResult {
            run,
            report,
            events,
            calls: self.calls.lock().unwrap().clone(),
        }
    }
}

/// Test result from running a pipeline
#[derive(Debug, Clone)]
pub struct RunTestResult {
    pub run: Run,
    pub report: RunReport,
    pub events: Vec<ExecutionEvent>,
    pub calls: Vec<RecordedCall>,
}

impl RunTestResult {
    /// Step ids whose collaborator was called, in call order
    pub fn invoked(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.step_id.as_str()).collect()
    }

    pub fn call(&self, step_id: &str) -> Option<&RecordedCall> {
        self.calls.iter().find(|c| c.step_id == step_id)
    }

    pub fn step_state(&self, step_id: &str) -> &StepState {
        &self
            .run
            .step(step_id)
            .unwrap_or_else(|| panic!("Step '{}' not found in run", step_id))
            .state
    }

    /// Every log line joined, for substring checks
    pub fn log_text(&self) -> String {
        self.report
            .log
            .entries()
            .iter()
            .map(|e| e.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> String {
        let states: Vec<String> = self
            .run
            .steps()
            .iter()
            .map(|s| format!("{}={}", s.step.id, s.state.label()))
            .collect();
        format!("{:?} [{}]", self.report.status, states.join(", "))
    }
}

/// Parse a pipeline from YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml)
        .and_then(|config| config.to_pipeline())
        .unwrap_or_else(|e| panic!("Failed to parse pipeline YAML: {:#}", e))
}

/// Assert the run ended in success with exit code 0
pub fn assert_run_succeeded(result: &RunTestResult) {
    assert!(
        result.report.is_success(),
        "Run should have succeeded, but was: {}",
        result.summary()
    );
    assert_eq!(result.report.exit_code(), 0);
    assert!(result.report.failure.is_none());
}

/// Assert the run failed at `step_id` with a non-zero exit code
pub fn assert_run_failed_at(result: &RunTestResult, step_id: &str, kind: FailureKind) {
    assert!(
        !result.report.is_success(),
        "Run should have failed, but was: {}",
        result.summary()
    );
    assert_ne!(result.report.exit_code(), 0);
    let failure = result
        .report
        .failure
        .as_ref()
        .unwrap_or_else(|| panic!("Failed run has no failure: {}", result.summary()));
    assert_eq!(failure.step, step_id);
    assert_eq!(failure.kind, kind);
}

/// Assert a step succeeded and its output contains `expected_output`
pub fn assert_step_succeeded(result: &RunTestResult, step_id: &str, expected_output: &str) {
    match result.step_state(step_id) {
        StepState::Succeeded { output, .. } => assert!(
            output.contains(expected_output),
            "Step '{}' output:\n{}\n\ndoes not contain:\n{}",
            step_id,
            output,
            expected_output
        ),
        other => panic!("Step '{}' should have succeeded, but was: {:?}", step_id, other),
    }
}

/// Assert a step failed with the given kind and error text
pub fn assert_step_failed(
    result: &RunTestResult,
    step_id: &str,
    expected_kind: FailureKind,
    expected_error: &str,
) {
    match result.step_state(step_id) {
        StepState::Failed { error, kind, .. } => {
            assert_eq!(*kind, expected_kind, "Step '{}' failed with: {}", step_id, error);
            assert!(
                error.contains(expected_error),
                "Step '{}' error:\n{}\n\ndoes not contain:\n{}",
                step_id,
                error,
                expected_error
            );
        }
        other => panic!("Step '{}' should have failed, but was: {:?}", step_id, other),
    }
}

pub fn assert_step_skipped(result: &RunTestResult, step_id: &str) {
    assert!(
        matches!(result.step_state(step_id), StepState::Skipped { .. }),
        "Step '{}' should be skipped: {}",
        step_id,
        result.summary()
    );
}

/// Assert exactly these steps reached their collaborator, in this order
pub fn assert_invoked(result: &RunTestResult, expected: &[&str]) {
    assert_eq!(
        result.invoked(),
        expected,
        "Expected invocations: {:?}\nActual: {:?}",
        expected,
        result.invoked()
    );
}
