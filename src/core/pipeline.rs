//! Pipeline and run domain models

use crate::core::{
    config::PipelineConfig,
    state::{InvalidTransition, RunState, RunStatus, StepState, Trigger},
    step::Step,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// A pipeline definition: a fixed, ordered list of steps
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Events this pipeline runs for
    pub triggers: Vec<Trigger>,

    /// Pipeline variables
    pub variables: HashMap<String, String>,

    /// Steps in declaration order
    steps: Vec<Step>,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let steps = config
            .steps
            .iter()
            .map(Step::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Pipeline {
            name: config.name.clone(),
            triggers: config.on.clone(),
            variables: config.variables_as_string_map(),
            steps,
        })
    }

    /// Build a pipeline directly from steps
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Pipeline {
            name: name.into(),
            triggers: Trigger::ALL.to_vec(),
            variables: HashMap::new(),
            steps,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Whether `trigger` starts this pipeline
    pub fn accepts(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }

    /// Create a pending run for a trigger event
    pub fn create_run(&self, trigger: Trigger) -> Run {
        Run {
            state: RunState::new(),
            pipeline_name: self.name.clone(),
            trigger,
            variables: self.variables.clone(),
            steps: self
                .steps
                .iter()
                .cloned()
                .map(|step| StepRun {
                    step,
                    state: StepState::Pending,
                })
                .collect(),
        }
    }
}

/// A step definition paired with its runtime state
#[derive(Debug, Clone)]
pub struct StepRun {
    /// Definition; never changed during a run
    pub step: Step,

    pub state: StepState,
}

/// One execution of a pipeline, created per trigger event
#[derive(Debug, Clone)]
pub struct Run {
    /// Lifecycle state, changed only through `start`/`succeed`/`fail`
    state: RunState,

    pub pipeline_name: String,

    pub trigger: Trigger,

    /// Variables snapshot for this run
    pub variables: HashMap<String, String>,

    steps: Vec<StepRun>,
}

impl Run {
    pub fn run_id(&self) -> Uuid {
        self.state.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.state.completed_at
    }

    pub fn steps(&self) -> &[StepRun] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&StepRun> {
        self.steps.iter().find(|s| s.step.id == id)
    }

    /// Update the runtime state of the step at `index`
    pub(crate) fn set_step_state(&mut self, index: usize, state: StepState) {
        if let Some(step_run) = self.steps.get_mut(index) {
            step_run.state = state;
        }
    }

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.state.start()
    }

    pub fn succeed(&mut self) -> Result<(), InvalidTransition> {
        self.state.succeed()
    }

    pub fn fail(&mut self) -> Result<(), InvalidTransition> {
        self.state.fail()
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// IDs of steps whose collaborator was invoked, in order
    pub fn executed_steps(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Succeeded { .. } | StepState::Failed { .. }))
            .map(|s| s.step.id.clone())
            .collect()
    }
}
