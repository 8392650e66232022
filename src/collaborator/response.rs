//! Collaborator result types

use crate::collaborator::subprocess::CommandFailure;
use crate::core::FailureKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error types for step execution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    /// Missing or invalid input, or an action nothing can run
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The collaborator reported failure
    #[error("step execution error: {0}")]
    Execution(String),

    /// An external tool exited unsuccessfully
    #[error("step execution error: {0}")]
    Command(CommandFailure),

    /// The step ran past its timeout
    #[error("timeout after {0} seconds")]
    Timeout(u64),
}

impl StepError {
    pub fn missing_input(name: &str) -> Self {
        StepError::Configuration(format!("missing required input '{}'", name))
    }

    pub fn invalid_input(name: &str, reason: impl std::fmt::Display) -> Self {
        StepError::Configuration(format!("invalid input '{}': {}", name, reason))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Configuration(_) => FailureKind::Configuration,
            StepError::Execution(_) | StepError::Command(_) => FailureKind::Execution,
            StepError::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Output of a successful collaborator call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorOutput {
    /// Captured standard output; becomes the step output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Files produced by the step
    pub artifacts: Vec<PathBuf>,
}

impl CollaboratorOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_artifact(mut self, path: PathBuf) -> Self {
        self.artifacts.push(path);
        self
    }
}
