//! Run log - the single accumulating log buffer of a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MASK: &str = "***";

/// Where a log line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    /// Written by the runner itself
    Runner,
    /// Collaborator standard output
    Stdout,
    /// Collaborator standard error
    Stderr,
}

/// One line in the run log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,

    /// Step the line belongs to, `None` for run-level lines
    pub step: Option<String>,

    pub stream: LogStream,

    pub line: String,
}

/// Secret values to hide from anything written out
#[derive(Debug, Clone, Default)]
pub struct SecretMask {
    values: Vec<String>,
}

impl SecretMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value that must never be written out
    pub fn add(&mut self, value: &str) {
        if !value.is_empty() && !self.values.iter().any(|m| m == value) {
            self.values.push(value.to_string());
            // longest first so overlapping secrets are fully hidden
            self.values.sort_by_key(|m| std::cmp::Reverse(m.len()));
        }
    }

    /// Replace registered secrets in `text`
    pub fn apply(&self, text: &str) -> String {
        self.values
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret, MASK))
    }
}

/// Accumulating log for one run
///
/// Every line is masked against the registered secret values before it is
/// stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLog {
    entries: Vec<LogEntry>,

    #[serde(skip)]
    masks: SecretMask,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value that must never appear in the log
    pub fn add_mask(&mut self, value: &str) {
        self.masks.add(value);
    }

    /// Replace registered secrets in `text`
    pub fn mask(&self, text: &str) -> String {
        self.masks.apply(text)
    }

    /// The secrets this log hides
    pub fn secret_mask(&self) -> &SecretMask {
        &self.masks
    }

    /// Append a single line
    pub fn push(&mut self, step: Option<&str>, stream: LogStream, line: &str) {
        self.entries.push(LogEntry {
            at: Utc::now(),
            step: step.map(str::to_string),
            stream,
            line: self.mask(line),
        });
    }

    /// Append every line of `text`
    pub fn push_lines(&mut self, step: Option<&str>, stream: LogStream, text: &str) {
        for line in text.lines() {
            self.push(step, stream, line);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Lines belonging to one step
    pub fn lines_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.step.as_deref() == Some(step))
            .map(|e| e.line.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
