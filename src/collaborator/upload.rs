//! Upload collaborator - posts the coverage report to the coverage service

use crate::collaborator::{Collaborator, CollaboratorOutput, Invocation, StepError, ToolConfig};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct UploadCollaborator {
    config: ToolConfig,
}

impl UploadCollaborator {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<reqwest::Client, StepError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.http_timeout_secs))
            .build()
            .map_err(|e| StepError::Execution(format!("failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl Collaborator for UploadCollaborator {
    fn required_inputs(&self) -> &'static [&'static str] {
        &["token", "file"]
    }

    async fn execute(&self, invocation: &Invocation<'_>) -> Result<CollaboratorOutput, StepError> {
        let token = invocation.require("token")?;
        let file = invocation.require("file")?;

        // relative paths are resolved against the work directory
        let path = invocation.workdir.join(file);
        let report = tokio::fs::read(&path).await.map_err(|e| {
            StepError::Execution(format!("cannot read report {}: {}", path.display(), e))
        })?;

        info!(
            "Uploading {} ({} bytes) to {}",
            invocation.mask(file),
            report.len(),
            self.config.upload_url
        );

        let response = self
            .client()?
            .post(&self.config.upload_url)
            .header(AUTHORIZATION, format!("token {}", token))
            .header(CONTENT_TYPE, "text/plain")
            .body(report)
            .send()
            .await
            .map_err(|e| StepError::Execution(format!("upload request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("Upload endpoint answered {}", status);

        if !status.is_success() {
            return Err(StepError::Execution(format!(
                "upload rejected with HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(CollaboratorOutput::new(body.trim()))
    }
}
