//! Collaborators: the external actions behind pipeline steps

pub mod checkout;
pub mod client;
pub mod coverage;
pub mod response;
pub mod subprocess;
pub mod toolchain;
pub mod upload;

use crate::core::{ActionRef, SecretMask};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use checkout::CheckoutCollaborator;
pub use client::ToolConfig;
pub use coverage::{CoverageCollaborator, COVERAGE_REPORT};
pub use response::{CollaboratorOutput, StepError};
pub use toolchain::ToolchainCollaborator;
pub use upload::UploadCollaborator;

/// Rendered inputs of a step
pub type StepInputs = BTreeMap<String, String>;

/// Everything a collaborator gets to perform one step
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub step_id: &'a str,
    pub action: &'a ActionRef,
    pub inputs: &'a StepInputs,
    pub workdir: &'a Path,
    /// Secrets of the run, for anything the collaborator logs
    pub secrets: &'a SecretMask,
}

impl<'a> Invocation<'a> {
    /// Input value, `None` when absent or empty
    pub fn input(&self, name: &str) -> Option<&'a str> {
        self.inputs
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `text` with the run's secrets replaced
    pub fn mask(&self, text: &str) -> String {
        self.secrets.apply(text)
    }

    /// Required input value
    pub fn require(&self, name: &str) -> Result<&'a str, StepError> {
        self.input(name).ok_or_else(|| StepError::missing_input(name))
    }
}

/// Trait for step actions - allows for different implementations
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Inputs that must be present and non-empty before `execute` is called
    fn required_inputs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Check input values beyond presence
    fn validate_inputs(&self, _inputs: &StepInputs) -> Result<(), StepError> {
        Ok(())
    }

    /// Timeout derived from the inputs, if the collaborator has one
    fn timeout(&self, _inputs: &StepInputs) -> Option<Duration> {
        None
    }

    /// Perform the step
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError>;
}

/// Parse a boolean input
pub fn parse_bool(name: &str, value: &str) -> Result<bool, StepError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" | "" => Ok(false),
        other => Err(StepError::invalid_input(
            name,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}

/// Maps action names to collaborators
#[derive(Clone, Default)]
pub struct CollaboratorRegistry {
    entries: HashMap<String, Arc<dyn Collaborator>>,
}

impl CollaboratorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in collaborators
    ///
    /// Each is reachable by a short name and by its well-known action name.
    pub fn builtin(config: ToolConfig) -> Self {
        let mut registry = Self::new();
        registry.register_aliases(
            &["checkout", "actions/checkout"],
            Arc::new(CheckoutCollaborator::new(config.clone())),
        );
        registry.register_aliases(
            &["toolchain", "actions-rs/toolchain", "dtolnay/rust-toolchain"],
            Arc::new(ToolchainCollaborator::new(config.clone())),
        );
        registry.register_aliases(
            &["test", "actions-rs/tarpaulin"],
            Arc::new(CoverageCollaborator::new(config.clone())),
        );
        registry.register_aliases(
            &["upload", "codecov/codecov-action"],
            Arc::new(UploadCollaborator::new(config)),
        );
        registry
    }

    /// Register a collaborator under one action name
    pub fn register<C: Collaborator + 'static>(&mut self, name: impl Into<String>, collaborator: C) {
        self.entries.insert(name.into(), Arc::new(collaborator));
    }

    /// Register one collaborator under several action names
    pub fn register_aliases(&mut self, names: &[&str], collaborator: Arc<dyn Collaborator>) {
        for name in names {
            self.entries.insert(name.to_string(), collaborator.clone());
        }
    }

    /// Look up the collaborator for an action; the version pin is ignored
    pub fn resolve(&self, action: &ActionRef) -> Option<Arc<dyn Collaborator>> {
        self.entries.get(&action.name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered action names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CollaboratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaboratorRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
