//! Step executor - runs individual steps through their collaborator

use crate::{
    collaborator::{CollaboratorOutput, CollaboratorRegistry, Invocation, StepError},
    core::{LogStream, RunContext, RunLog, Step},
};
use std::path::PathBuf;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Executes a single step
pub struct StepExecutor {
    registry: CollaboratorRegistry,
    workdir: PathBuf,
}

impl StepExecutor {
    pub fn new(registry: CollaboratorRegistry, workdir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            workdir: workdir.into(),
        }
    }

    /// Execute a step and append its output to the log
    ///
    /// # Errors
    /// - `StepError::Configuration` for an unknown action, a missing required
    ///   input or an input the collaborator rejects; the collaborator is not
    ///   called in that case
    /// - `StepError::Execution` when the collaborator fails
    /// - `StepError::Timeout` when the effective timeout elapses
    pub async fn execute(
        &self,
        step: &Step,
        context: &RunContext,
        log: &mut RunLog,
    ) -> Result<CollaboratorOutput, StepError> {
        info!("Executing step: {} ({})", step.id, step.action);

        let collaborator = self.registry.resolve(&step.action).ok_or_else(|| {
            StepError::Configuration(format!("unknown action '{}'", step.action.name))
        })?;

        let inputs = step.render_inputs(context);
        debug!("Inputs for step {}: {}", step.id, log.mask(&format!("{:?}", inputs)));

        for name in collaborator.required_inputs() {
            let present = inputs.get(*name).is_some_and(|v| !v.trim().is_empty());
            if !present {
                return Err(StepError::missing_input(name));
            }
        }
        collaborator.validate_inputs(&inputs)?;

        let limit = effective_timeout(
            step.timeout_secs.map(Duration::from_secs),
            collaborator.timeout(&inputs),
        );

        let invocation = Invocation {
            step_id: &step.id,
            action: &step.action,
            inputs: &inputs,
            workdir: &self.workdir,
            secrets: log.secret_mask(),
        };

        let result = match limit {
            Some(limit) => match timeout(limit, collaborator.execute(&invocation)).await {
                Ok(result) => result,
                Err(_) => {
                    error!("Timeout for step {} after {}s", step.id, limit.as_secs());
                    Err(StepError::Timeout(limit.as_secs()))
                }
            },
            None => collaborator.execute(&invocation).await,
        };

        match &result {
            Ok(output) => {
                log.push_lines(Some(&step.id), LogStream::Stdout, &output.stdout);
                log.push_lines(Some(&step.id), LogStream::Stderr, &output.stderr);
            }
            Err(e) => {
                if let StepError::Command(failure) = e {
                    log.push_lines(Some(&step.id), LogStream::Stdout, &failure.stdout);
                    log.push_lines(Some(&step.id), LogStream::Stderr, &failure.stderr);
                }
                error!("Step {} failed: {}", step.id, log.mask(&e.to_string()));
            }
        }

        result
    }
}

/// The smaller of the step's own timeout and the collaborator's
fn effective_timeout(step: Option<Duration>, collaborator: Option<Duration>) -> Option<Duration> {
    match (step, collaborator) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
