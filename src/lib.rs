//! cirun - a sequential CI pipeline runner

pub mod cli;
pub mod collaborator;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::collaborator::{Collaborator, CollaboratorOutput, CollaboratorRegistry, StepError, ToolConfig};
pub use crate::core::{Pipeline, Run, RunContext, RunLog, RunStatus, Step, StepState, Trigger};
pub use crate::execution::{ExecutionEvent, RunReport, Runner, RunnerConfig};
