//! Final report of a run

use crate::core::{FailureKind, Run, RunLog, RunStatus, StepState, Trigger};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// The step failure that ended a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub step: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.message)
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub id: String,
    pub name: String,
    pub action: String,
    pub continue_on_error: bool,
    #[serde(flatten)]
    pub state: StepState,
}

/// Everything known about a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub pipeline: String,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,

    /// Set when a step failed without continue-on-error
    pub failure: Option<RunFailure>,

    pub log: RunLog,
}

impl RunReport {
    pub fn new(run: &Run, failure: Option<RunFailure>, log: RunLog) -> Self {
        Self {
            run_id: run.run_id(),
            pipeline: run.pipeline_name.clone(),
            trigger: run.trigger,
            status: run.status(),
            started_at: run.started_at(),
            completed_at: run.completed_at(),
            steps: run
                .steps()
                .iter()
                .map(|s| StepReport {
                    id: s.step.id.clone(),
                    name: s.step.name.clone(),
                    action: s.step.action.to_string(),
                    continue_on_error: s.step.continue_on_error,
                    state: s.state.clone(),
                })
                .collect(),
            failure,
            log,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Process exit code for this run
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn step(&self, id: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Steps that failed with continue-on-error
    pub fn tolerated_failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Failed { tolerated: true, .. }))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }

    /// Write the report as JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}
