//! Main execution engine - runs a pipeline's steps in order

use crate::{
    collaborator::CollaboratorRegistry,
    core::{
        FailureKind, InvalidTransition, LogStream, Run, RunContext, RunLog, RunStatus, StepState,
        Trigger,
    },
    execution::{RunFailure, RunReport, RunnerConfig, StepExecutor},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
        trigger: Trigger,
        total_steps: usize,
    },
    StepStarted {
        /// Zero-based position in the pipeline
        index: usize,
        total: usize,
        step_id: String,
        step_name: String,
    },
    StepSucceeded {
        step_id: String,
        output: String,
    },
    StepFailed {
        step_id: String,
        kind: FailureKind,
        error: String,
        tolerated: bool,
    },
    StepSkipped {
        step_id: String,
        reason: String,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Sequential pipeline runner
pub struct Runner {
    executor: StepExecutor,
    config: RunnerConfig,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl Runner {
    pub fn new(registry: CollaboratorRegistry, config: RunnerConfig) -> Self {
        Self {
            executor: StepExecutor::new(registry, config.workdir.clone()),
            config,
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    fn build_context(&self, run: &Run) -> RunContext {
        let mut context = RunContext::new(run.trigger);
        for (key, value) in run.variables.iter().chain(self.config.variables.iter()) {
            context.set_variable(key.clone(), value.clone());
        }
        for (key, value) in &self.config.secrets {
            context.set_secret(key.clone(), value.clone());
        }
        context
    }

    /// Execute every step of a pending run, in order
    ///
    /// The first failure of a step without continue-on-error fails the run
    /// and every later step is marked skipped without being invoked.
    ///
    /// # Errors
    /// Returns `InvalidTransition` if the run is not pending.
    pub async fn execute(&self, run: &mut Run) -> Result<RunReport, InvalidTransition> {
        run.start()?;

        let run_id = run.run_id();
        let total = run.steps().len();
        let mut context = self.build_context(run);
        let mut log = RunLog::new();
        for secret in context.secret_values() {
            log.add_mask(secret);
        }

        info!("Starting run {} of {} ({})", run_id, run.pipeline_name, run.trigger);
        log.push(
            None,
            LogStream::Runner,
            &format!("Run {} of '{}' triggered by {}", run_id, run.pipeline_name, run.trigger),
        );
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            pipeline_name: run.pipeline_name.clone(),
            trigger: run.trigger,
            total_steps: total,
        })
        .await;

        let mut failure: Option<RunFailure> = None;

        for index in 0..total {
            let step = run.steps()[index].step.clone();

            if let Some(failed) = &failure {
                let reason = format!("step '{}' failed", failed.step);
                log.push(Some(&step.id), LogStream::Runner, &format!("Skipped: {}", reason));
                run.set_step_state(index, StepState::Skipped { reason: reason.clone() });
                self.emit_event(ExecutionEvent::StepSkipped {
                    step_id: step.id.clone(),
                    reason,
                })
                .await;
                continue;
            }

            let started_at = Utc::now();
            run.set_step_state(index, StepState::Running { started_at });
            log.push(
                Some(&step.id),
                LogStream::Runner,
                &format!("Step {}/{}: {} ({})", index + 1, total, step.name, step.action),
            );
            self.emit_event(ExecutionEvent::StepStarted {
                index,
                total,
                step_id: step.id.clone(),
                step_name: step.name.clone(),
            })
            .await;

            match self.executor.execute(&step, &context, &mut log).await {
                Ok(output) => {
                    let masked = log.mask(output.stdout.trim());
                    context.set_step_output(&step.id, output.stdout);
                    run.set_step_state(
                        index,
                        StepState::Succeeded {
                            output: masked.clone(),
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    info!("Step {} completed successfully", step.id);
                    self.emit_event(ExecutionEvent::StepSucceeded {
                        step_id: step.id.clone(),
                        output: masked,
                    })
                    .await;
                }
                Err(e) => {
                    let kind = e.kind();
                    let message = log.mask(&e.to_string());
                    let tolerated = step.continue_on_error;

                    if tolerated {
                        warn!("Step {} failed, continuing: {}", step.id, message);
                        log.push(
                            Some(&step.id),
                            LogStream::Runner,
                            &format!("Failed (continue-on-error): {}", message),
                        );
                    } else {
                        error!("Step {} failed, aborting run: {}", step.id, message);
                        log.push(Some(&step.id), LogStream::Runner, &format!("Failed: {}", message));
                        failure = Some(RunFailure {
                            step: step.id.clone(),
                            kind,
                            message: message.clone(),
                        });
                    }

                    run.set_step_state(
                        index,
                        StepState::Failed {
                            error: message.clone(),
                            kind,
                            tolerated,
                            started_at,
                            failed_at: Utc::now(),
                        },
                    );
                    self.emit_event(ExecutionEvent::StepFailed {
                        step_id: step.id.clone(),
                        kind,
                        error: message,
                        tolerated,
                    })
                    .await;
                }
            }
        }

        if failure.is_some() {
            run.fail()?;
        } else {
            run.succeed()?;
        }

        let status = run.status();
        info!("Run {} finished: {:?}", run_id, status);
        log.push(None, LogStream::Runner, &format!("Run finished: {:?}", status));
        self.emit_event(ExecutionEvent::RunFinished { run_id, status }).await;

        Ok(RunReport::new(run, failure, log))
    }
}
