//! Runner configuration

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Settings handed to the runner at construction
///
/// Secrets live here rather than being read from the process environment;
/// the command line decides where they come from.
#[derive(Clone, Default)]
pub struct RunnerConfig {
    /// Directory the collaborators work in
    pub workdir: PathBuf,

    /// Secret values available as `secrets.NAME`
    pub secrets: HashMap<String, String>,

    /// Variables that override the pipeline's own
    pub variables: HashMap<String, String>,
}

impl RunnerConfig {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    pub fn with_secrets<I>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.secrets.extend(secrets);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.variables.extend(variables);
        self
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut secret_names: Vec<&str> = self.secrets.keys().map(String::as_str).collect();
        secret_names.sort_unstable();
        f.debug_struct("RunnerConfig")
            .field("workdir", &self.workdir)
            .field("secrets", &secret_names)
            .field("variables", &self.variables)
            .finish()
    }
}
