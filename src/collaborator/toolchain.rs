//! Toolchain collaborator - installs a Rust toolchain with rustup

use crate::collaborator::{
    parse_bool,
    subprocess::{run_command, CommandSpec},
    Collaborator, CollaboratorOutput, Invocation, StepError, StepInputs, ToolConfig,
};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ToolchainCollaborator {
    config: ToolConfig,
}

impl ToolchainCollaborator {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Collaborator for ToolchainCollaborator {
    fn required_inputs(&self) -> &'static [&'static str] {
        &["toolchain"]
    }

    fn validate_inputs(&self, inputs: &StepInputs) -> Result<(), StepError> {
        if let Some(value) = inputs.get("override") {
            parse_bool("override", value)?;
        }
        if let Some(toolchain) = inputs.get("toolchain") {
            if toolchain.trim().chars().any(char::is_whitespace) {
                return Err(StepError::invalid_input(
                    "toolchain",
                    "must be a single toolchain name",
                ));
            }
        }
        Ok(())
    }

    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError> {
        let toolchain = invocation.require("toolchain")?;
        let set_override = match invocation.input("override") {
            Some(value) => parse_bool("override", value)?,
            None => false,
        };

        info!("Installing toolchain {}", invocation.mask(toolchain));
        let install = CommandSpec::new(&self.config.rustup_program, invocation.workdir)
            .args(["toolchain", "install", toolchain, "--profile", "minimal"]);
        let installed = run_command(&install, invocation.secrets).await?;
        let mut stderr = installed.stderr;

        if set_override {
            info!(
                "Setting {} as override for {}",
                invocation.mask(toolchain),
                invocation.workdir.display()
            );
            let override_cmd = CommandSpec::new(&self.config.rustup_program, invocation.workdir)
                .args(["override", "set", toolchain]);
            stderr.push_str(&run_command(&override_cmd, invocation.secrets).await?.stderr);
        }

        Ok(CollaboratorOutput::new(toolchain).with_stderr(stderr))
    }
}
