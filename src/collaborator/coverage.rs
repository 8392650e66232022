//! Test collaborator - runs the test suite with coverage

use crate::collaborator::{
    subprocess::{run_command, CommandSpec},
    Collaborator, CollaboratorOutput, Invocation, StepError, StepInputs, ToolConfig,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Coverage report location, relative to the work directory
pub const COVERAGE_REPORT: &str = "lcov.info";

/// Runs the coverage command and requires it to produce `lcov.info`
#[derive(Debug, Clone)]
pub struct CoverageCollaborator {
    config: ToolConfig,
}

impl CoverageCollaborator {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn parse_timeout(value: &str) -> Result<u64, StepError> {
        match value.trim().parse::<u64>() {
            Ok(0) => Err(StepError::invalid_input("timeout", "must be greater than zero")),
            Ok(secs) => Ok(secs),
            Err(e) => Err(StepError::invalid_input("timeout", e)),
        }
    }
}

#[async_trait]
impl Collaborator for CoverageCollaborator {
    fn validate_inputs(&self, inputs: &StepInputs) -> Result<(), StepError> {
        match inputs.get("timeout").map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(value) => Self::parse_timeout(value).map(|_| ()),
            None => Ok(()),
        }
    }

    fn timeout(&self, inputs: &StepInputs) -> Option<Duration> {
        inputs
            .get("timeout")
            .and_then(|v| Self::parse_timeout(v).ok())
            .map(Duration::from_secs)
    }

    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError> {
        let (program, base_args) = self
            .config
            .test_command
            .split_first()
            .ok_or_else(|| StepError::Configuration("test command is empty".to_string()))?;

        let report = invocation.workdir.join(COVERAGE_REPORT);
        // a report left over from an earlier run must not count as output
        if let Err(e) = tokio::fs::remove_file(&report).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(StepError::Execution(format!(
                    "cannot remove stale {}: {}",
                    report.display(),
                    e
                )));
            }
        }

        let extra_args = invocation.input("args").unwrap_or_default().split_whitespace();
        let command = CommandSpec::new(program, invocation.workdir)
            .args(base_args.iter().cloned())
            .args(extra_args);

        let shown = invocation.mask(&command.display());
        info!("Running tests: {}", shown);
        let output = run_command(&command, invocation.secrets).await?;

        if !tokio::fs::try_exists(&report).await.unwrap_or(false) {
            return Err(StepError::Execution(format!(
                "`{}` succeeded but did not produce {}",
                shown,
                COVERAGE_REPORT
            )));
        }
        debug!("Coverage report written to {}", report.display());

        Ok(CollaboratorOutput::new(output.stdout)
            .with_stderr(output.stderr)
            .with_artifact(report))
    }
}
