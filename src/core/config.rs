//! Pipeline configuration from YAML

use crate::core::{
    state::Trigger,
    step::{slugify, ActionRef},
    Pipeline,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Events that start a run
    #[serde(default = "default_triggers")]
    pub on: Vec<Trigger>,

    /// Pipeline variables available to step inputs
    #[serde(default)]
    variables: HashMap<String, Value>,

    /// Pipeline steps, in execution order
    pub steps: Vec<StepConfig>,
}

fn default_triggers() -> Vec<Trigger> {
    Trigger::ALL.to_vec()
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Optional identifier; derived from the name when absent
    #[serde(default)]
    pub id: Option<String>,

    /// Human-readable step name
    pub name: String,

    /// Action reference, `name[@version]`
    pub uses: String,

    /// Step inputs
    #[serde(default, rename = "with", alias = "inputs")]
    pub with: BTreeMap<String, Value>,

    /// Keep running the pipeline if this step fails
    #[serde(default, alias = "continue-on-error")]
    pub continue_on_error: bool,

    /// Hard timeout for this step (seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl StepConfig {
    /// The explicit id, or a slug of the name
    pub fn effective_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| slugify(&self.name))
    }

    /// Inputs converted to strings; scalars only
    pub fn inputs_as_strings(&self) -> BTreeMap<String, String> {
        self.with
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
            .collect()
    }
}

/// String form of a YAML scalar, `None` for sequences and mappings
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }

        if self.on.is_empty() {
            anyhow::bail!("Pipeline '{}' declares no trigger events", self.name);
        }

        let mut seen_ids = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                anyhow::bail!("Step #{} has an empty name", index + 1);
            }

            let id = step.effective_id();
            if id.is_empty() {
                anyhow::bail!("Step '{}' has no usable id; set `id` explicitly", step.name);
            }
            if !seen_ids.insert(id.clone()) {
                anyhow::bail!("Duplicate step ID: {}", id);
            }

            step.uses
                .parse::<ActionRef>()
                .with_context(|| format!("Step '{}' has an invalid `uses`", step.name))?;

            if step.timeout_secs == Some(0) {
                anyhow::bail!("Step '{}' has a zero timeout", step.name);
            }

            for (key, value) in &step.with {
                if scalar_to_string(value).is_none() {
                    anyhow::bail!(
                        "Step '{}' input '{}' must be a string, number or boolean",
                        step.name,
                        key
                    );
                }
            }
        }

        for (key, value) in &self.variables {
            if scalar_to_string(value).is_none() {
                anyhow::bail!("Variable '{}' must be a string, number or boolean", key);
            }
        }

        Ok(())
    }

    /// Variables as strings
    pub fn variables_as_string_map(&self) -> HashMap<String, String> {
        self.variables
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
            .collect()
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Result<Pipeline> {
        Pipeline::from_config(self)
    }
}
