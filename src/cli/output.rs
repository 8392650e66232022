//! CLI output formatting

use crate::{
    core::{RunStatus, StepState},
    execution::{ExecutionEvent, RunReport},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

/// Log lines of the failed step shown under the summary
const FAILURE_LOG_LINES: usize = 15;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner for a running step
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        StepState::Failed { tolerated: true, .. } => style("FAILED (tolerated)").yellow().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Success => style("SUCCESS").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
///
/// `StepStarted` is shown by the spinner and yields `None`.
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    let line = match event {
        ExecutionEvent::RunStarted {
            run_id,
            pipeline_name,
            trigger,
            total_steps,
        } => format!(
            "{} Running {} on {} ({} steps, {})",
            ROCKET,
            style(pipeline_name).bold(),
            style(trigger).cyan(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted { .. } => return None,
        ExecutionEvent::StepSucceeded { step_id, .. } => {
            format!("{} {}", CHECK, style(step_id).green())
        }
        ExecutionEvent::StepFailed {
            step_id,
            error,
            tolerated: true,
            ..
        } => format!(
            "{} {} (continue-on-error): {}",
            WARN,
            style(step_id).yellow(),
            style(error).dim()
        ),
        ExecutionEvent::StepFailed { step_id, error, .. } => {
            format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim())
        }
        ExecutionEvent::StepSkipped { step_id, reason } => {
            format!("{} {} ({})", SKIP, style(step_id).dim(), reason)
        }
        ExecutionEvent::RunFinished { run_id, status } => format!(
            "{} Run ({}) finished: {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    };
    Some(line)
}

/// Prints events as they arrive, with a spinner while a step runs
#[derive(Default)]
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &ExecutionEvent) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };

        if let Some(active) = spinner.take() {
            active.finish_and_clear();
        }

        if let ExecutionEvent::StepStarted {
            index,
            total,
            step_name,
            ..
        } = event
        {
            *spinner = Some(create_spinner(format!(
                "[{}/{}] {}",
                index + 1,
                total,
                step_name
            )));
        }

        if let Some(line) = format_execution_event(event) {
            println!("{}", line);
        }
    }
}

/// Per-step summary table for a finished run
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        out.push_str(&format!(
            "  {:<24} {:<32} {}\n",
            step.id,
            style(&step.action).dim(),
            format_step_state(&step.state)
        ));
    }
    if let Some(failure) = &report.failure {
        out.push_str(&format!("\n{} {}\n", CROSS, style(failure).red()));
        let lines: Vec<&str> = report.log.lines_for(&failure.step).collect();
        if !lines.is_empty() {
            out.push_str(&format_log_tail(&lines, FAILURE_LOG_LINES));
            out.push('\n');
        }
    }
    if let (Some(started), Some(completed)) = (report.started_at, report.completed_at) {
        if let Ok(elapsed) = completed.signed_duration_since(started).to_std() {
            out.push_str(&format!("  Duration: {}\n", style(format_duration(elapsed)).dim()));
        }
    }
    out
}

/// Last `max_lines` log lines, indented
pub fn format_log_tail(lines: &[&str], max_lines: usize) -> String {
    let start = lines.len().saturating_sub(max_lines);
    let mut out = String::new();
    if start > 0 {
        out.push_str(&format!(
            "    {}\n",
            style(format!("[... {} earlier lines]", start)).dim()
        ));
    }
    let tail: Vec<String> = lines[start..].iter().map(|l| format!("    {}", l)).collect();
    out.push_str(&tail.join("\n"));
    out
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
