//! Settings for the built-in collaborators

/// Default coverage command; writes `lcov.info` into the work directory
pub const DEFAULT_TEST_COMMAND: [&str; 4] = ["cargo", "tarpaulin", "--out", "Lcov"];

/// Default coverage upload endpoint
pub const DEFAULT_UPLOAD_URL: &str = "https://codecov.io/upload/v2";

/// Configuration for the external tools collaborators call
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Path to the git executable
    pub git_program: String,

    /// Path to the rustup executable
    pub rustup_program: String,

    /// Program and leading arguments of the coverage command
    pub test_command: Vec<String>,

    /// Endpoint the coverage report is posted to
    pub upload_url: String,

    /// Timeout for the upload request in seconds
    pub http_timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            rustup_program: "rustup".to_string(),
            test_command: DEFAULT_TEST_COMMAND.iter().map(|s| s.to_string()).collect(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            http_timeout_secs: 60,
        }
    }
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    pub fn with_rustup_program(mut self, program: impl Into<String>) -> Self {
        self.rustup_program = program.into();
        self
    }

    /// Set the coverage command from a whitespace separated string
    ///
    /// An empty string keeps the current command.
    pub fn with_test_command(mut self, command: &str) -> Self {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if !parts.is_empty() {
            self.test_command = parts;
        }
        self
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout_secs = timeout_secs;
        self
    }
}
