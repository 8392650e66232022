use anyhow::{Context, Result};
use cirun::cli::commands::{resolve_secrets, RunCommand, ValidateCommand};
use cirun::cli::output::*;
use cirun::cli::{Cli, Command};
use cirun::collaborator::{CollaboratorRegistry, ToolConfig};
use cirun::core::{config::PipelineConfig, Trigger};
use cirun::execution::{Runner, RunnerConfig};
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
    }

    Ok(())
}

fn tool_config(cmd: &RunCommand) -> ToolConfig {
    let mut config = ToolConfig::default();
    if let Some(url) = &cmd.upload_url {
        config = config.with_upload_url(url);
    }
    if let Some(command) = &cmd.test_command {
        config = config.with_test_command(command);
    }
    config
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let pipeline = config.to_pipeline()?;
    let trigger = Trigger::from(cmd.event);

    if !cmd.json {
        println!("{} Loaded pipeline: {}", INFO, style(&pipeline.name).bold());
    }

    if !pipeline.accepts(trigger) {
        if !cmd.json {
            println!(
                "{} {} does not run on {}, nothing to do",
                INFO,
                style(&pipeline.name).bold(),
                style(trigger).cyan()
            );
        }
        return Ok(());
    }

    for (key, value) in &cmd.variable {
        if !cmd.json {
            println!(
                "{} Variable override: {} = {}",
                INFO,
                style(key).cyan(),
                style(value).dim()
            );
        }
    }

    // environment lookups happen here and nowhere else
    let secrets = resolve_secrets(&cmd.secret, |name| std::env::var(name).ok());
    let runner_config = RunnerConfig::new(&cmd.workdir)
        .with_secrets(secrets)
        .with_variables(cmd.variable.iter().cloned());

    let registry = CollaboratorRegistry::builtin(tool_config(cmd));
    let runner = Runner::new(registry, runner_config);

    if !cmd.json {
        let reporter = Arc::new(ConsoleReporter::new());
        runner
            .add_event_handler(move |event| reporter.handle(&event))
            .await;
        println!();
    }

    let mut run = pipeline.create_run(trigger);
    let report = runner.execute(&mut run).await?;

    if let Some(path) = &cmd.report {
        report.write_to(path)?;
    }

    if cmd.json {
        println!("{}", report.to_json()?);
    } else {
        println!("\n{}", format_report(&report));
        if report.is_success() {
            println!(
                "{} {} completed {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("successfully").green()
            );
        } else {
            println!(
                "{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red()
            );
        }
    }

    if !report.is_success() {
        if let Some(failure) = &report.failure {
            error!("{}", failure);
        }
        std::process::exit(report.exit_code());
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    let registry = CollaboratorRegistry::builtin(ToolConfig::default());
    let result = PipelineConfig::from_file(&cmd.file).and_then(|config| {
        let pipeline = config.to_pipeline()?;
        let unknown: Vec<String> = pipeline
            .steps()
            .iter()
            .filter(|s| !registry.contains(&s.action.name))
            .map(|s| format!("step '{}' uses unknown action '{}'", s.id, s.action.name))
            .collect();
        if !unknown.is_empty() {
            anyhow::bail!(unknown.join("\n"));
        }
        Ok(config)
    });

    match result {
        Ok(config) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            if let Some(description) = &config.description {
                println!("  Description: {}", style(description).dim());
            }
            let triggers: Vec<String> = config.on.iter().map(ToString::to_string).collect();
            println!("  Triggers: {}", style(triggers.join(", ")).cyan());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            for step in &config.steps {
                println!("    {} {}", style(step.effective_id()).bold(), style(&step.uses).dim());
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}
