//! Run context - values available to input placeholders

use crate::core::state::Trigger;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

/// Matches `{{ name }}` and `${{ name }}`
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Execution context for one run
///
/// Holds pipeline variables, the secrets handed to the runner, the trigger
/// and outputs of steps that already succeeded.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Pipeline variables (CLI overrides already applied)
    pub variables: HashMap<String, String>,

    /// Secrets passed in through the runner config
    secrets: HashMap<String, String>,

    /// Event that created the run
    pub trigger: Trigger,

    /// Outputs from succeeded steps (step_id -> output)
    pub step_outputs: HashMap<String, String>,
}

impl RunContext {
    /// Create an empty context for a trigger
    pub fn new(trigger: Trigger) -> Self {
        Self {
            variables: HashMap::new(),
            secrets: HashMap::new(),
            trigger,
            step_outputs: HashMap::new(),
        }
    }

    pub fn set_variable(&mut self, key: String, value: String) {
        self.variables.insert(key, value);
    }

    pub fn set_secret(&mut self, key: String, value: String) {
        self.secrets.insert(key, value);
    }

    /// Non-empty secret values, for log masking
    pub fn secret_values(&self) -> impl Iterator<Item = &str> {
        self.secrets.values().map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn set_step_output(&mut self, step_id: &str, output: String) {
        self.step_outputs.insert(step_id.to_string(), output);
    }

    /// Resolve a single placeholder name
    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(secret) = name.strip_prefix("secrets.") {
            return self.secrets.get(secret).cloned();
        }

        if let Some(rest) = name.strip_prefix("steps.") {
            return rest
                .strip_suffix(".output")
                .and_then(|id| self.step_outputs.get(id))
                .map(|output| output.trim().to_string());
        }

        match name {
            "event" | "github.event_name" => Some(self.trigger.to_string()),
            _ => self.variables.get(name).cloned(),
        }
    }

    /// Substitute every placeholder in `template`
    ///
    /// Unknown names render as the empty string.
    pub fn render(&self, template: &str) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| {
                let name = &caps[1];
                self.lookup(name).unwrap_or_else(|| {
                    warn!("Unresolved placeholder '{}', using empty value", name);
                    String::new()
                })
            })
            .into_owned()
    }
}
