//! Checkout collaborator - makes repository content available in the workdir

use crate::collaborator::{
    subprocess::{run_command, CommandSpec},
    Collaborator, CollaboratorOutput, Invocation, StepError, ToolConfig,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Clones or verifies the repository, then checks out the requested ref
#[derive(Debug, Clone)]
pub struct CheckoutCollaborator {
    config: ToolConfig,
}

impl CheckoutCollaborator {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn git(&self, invocation: &Invocation<'_>) -> CommandSpec {
        CommandSpec::new(&self.config.git_program, invocation.workdir)
    }
}

/// Directory to run `git clone` in and the destination relative to it
///
/// The destination is the workdir's last component so git resolves it the
/// same way whether the workdir is absolute or relative.
fn clone_target(workdir: &Path) -> (PathBuf, PathBuf) {
    match workdir.file_name() {
        Some(name) => {
            let parent = workdir
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (parent.to_path_buf(), PathBuf::from(name))
        }
        // `.`, `..` or `/`: clone straight into the directory
        None => (workdir.to_path_buf(), PathBuf::from(".")),
    }
}

#[async_trait]
impl Collaborator for CheckoutCollaborator {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError> {
        let mut stderr = String::new();

        match invocation.input("repository") {
            Some(repository) => {
                info!(
                    "Cloning {} into {}",
                    invocation.mask(repository),
                    invocation.workdir.display()
                );
                let (cwd, dest) = clone_target(invocation.workdir);
                tokio::fs::create_dir_all(&cwd).await.map_err(|e| {
                    StepError::Execution(format!("cannot create {}: {}", cwd.display(), e))
                })?;
                let clone = CommandSpec::new(&self.config.git_program, &cwd)
                    .args(["clone", "--quiet", repository])
                    .arg(dest.to_string_lossy());
                stderr.push_str(&run_command(&clone, invocation.secrets).await?.stderr);
            }
            None => {
                let check = self.git(invocation).args(["rev-parse", "--is-inside-work-tree"]);
                run_command(&check, invocation.secrets).await.map_err(|e| {
                    StepError::Execution(format!(
                        "{} is not a usable git work tree and no repository was given ({})",
                        invocation.workdir.display(),
                        e
                    ))
                })?;
            }
        }

        if let Some(reference) = invocation.input("ref") {
            info!("Checking out {}", invocation.mask(reference));
            let checkout = self.git(invocation).args(["checkout", "--quiet", reference]);
            stderr.push_str(&run_command(&checkout, invocation.secrets).await?.stderr);
        }

        let head = self.git(invocation).args(["rev-parse", "HEAD"]);
        let head = run_command(&head, invocation.secrets).await?;

        Ok(CollaboratorOutput::new(head.stdout.trim()).with_stderr(stderr))
    }
}
