//! CLI command definitions

use crate::core::Trigger;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Trigger event for this run
    #[arg(short, long, value_enum, default_value_t = EventArg::Push)]
    pub event: EventArg,

    /// Directory the steps run in
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Secret as NAME (read from the environment) or NAME=VALUE
    #[arg(long, value_parser = parse_secret)]
    pub secret: Vec<SecretArg>,

    /// Coverage upload endpoint
    #[arg(long, env = "CIRUN_UPLOAD_URL")]
    pub upload_url: Option<String>,

    /// Coverage command run by the test step
    #[arg(long, env = "CIRUN_TEST_COMMAND")]
    pub test_command: Option<String>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the run report as JSON instead of progress output
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Trigger event argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventArg {
    Push,
    #[value(alias = "pull_request")]
    PullRequest,
}

impl From<EventArg> for Trigger {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Push => Trigger::Push,
            EventArg::PullRequest => Trigger::PullRequest,
        }
    }
}

/// A `--secret` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretArg {
    pub name: String,
    /// Inline value; `None` means read the environment variable `name`
    pub value: Option<String>,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}

/// Parse NAME or NAME=VALUE
pub fn parse_secret(s: &str) -> Result<SecretArg, String> {
    let (name, value) = match s.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (s, None),
    };
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(format!("Invalid secret name: {}", s));
    }
    Ok(SecretArg {
        name: name.to_string(),
        value,
    })
}

/// Resolve secrets, looking up environment variables for bare names
///
/// A name with no matching variable is left out with a warning; a step
/// that requires it then fails with a configuration error.
pub fn resolve_secrets<F>(args: &[SecretArg], lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    args.iter()
        .filter_map(|arg| match &arg.value {
            Some(value) => Some((arg.name.clone(), value.clone())),
            None => match lookup(&arg.name) {
                Some(value) => Some((arg.name.clone(), value)),
                None => {
                    warn!("Secret {} is not set in the environment", arg.name);
                    None
                }
            },
        })
        .collect()
}
