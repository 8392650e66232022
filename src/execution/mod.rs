//! Pipeline execution engine

pub mod config;
pub mod engine;
pub mod executor;
pub mod report;

pub use config::RunnerConfig;
pub use engine::{EventHandler, ExecutionEvent, Runner};
pub use executor::StepExecutor;
pub use report::{RunFailure, RunReport, StepReport};
