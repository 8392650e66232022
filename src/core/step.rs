//! Step domain model

use crate::core::{config::StepConfig, context::RunContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reference to the action backing a step, e.g. `actions/checkout@v2`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Action name, selects the collaborator
    pub name: String,

    /// Version pin after `@`, if any
    pub version: Option<String>,
}

/// Error for a malformed action reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action reference '{0}': expected name[@version]")]
pub struct ActionRefError(pub String);

impl FromStr for ActionRef {
    type Err = ActionRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(ActionRefError(s.to_string()));
        }

        let (name, version) = match s.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (s, None),
        };

        if name.is_empty() || version.is_some_and(|v| v.is_empty() || v.contains('@')) {
            return Err(ActionRefError(s.to_string()));
        }

        Ok(ActionRef {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// A single step in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Identifier used in `steps.<id>.output` references
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Action backing this step
    pub action: ActionRef,

    /// Raw input values (may contain placeholders)
    pub inputs: BTreeMap<String, String>,

    /// Keep going when this step fails
    pub continue_on_error: bool,

    /// Hard timeout for the whole step, in seconds
    pub timeout_secs: Option<u64>,
}

impl Step {
    /// Create a step with no inputs; the id is derived from the name
    pub fn new(name: impl Into<String>, action: ActionRef) -> Self {
        let name = name.into();
        Step {
            id: slugify(&name),
            name,
            action,
            inputs: BTreeMap::new(),
            continue_on_error: false,
            timeout_secs: None,
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Create a step from a validated step config
    pub fn from_config(config: &StepConfig) -> Result<Self, ActionRefError> {
        Ok(Step {
            id: config.effective_id(),
            name: config.name.clone(),
            action: config.uses.parse()?,
            inputs: config.inputs_as_strings(),
            continue_on_error: config.continue_on_error,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Render every input through the context
    pub fn render_inputs(&self, context: &RunContext) -> BTreeMap<String, String> {
        self.inputs
            .iter()
            .map(|(key, value)| (key.clone(), context.render(value)))
            .collect()
    }
}

/// Lowercase, dash-separated identifier derived from a step name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
