use std::fmt;

use generator::LlmConfig;
use github::GitHubConfig;

/// Everything the orchestrator needs, resolved once at process start.
#[derive(Clone)]
pub struct AgentConfig {
    pub shared_secret: String,
    pub github: GitHubConfig,
    pub llm: LlmConfig,
}

impl AgentConfig {
    pub fn new(shared_secret: impl Into<String>, github: GitHubConfig, llm: LlmConfig) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            github,
            llm,
        }
    }

    /// An empty configured secret matches nothing.
    pub fn secret_matches(&self, candidate: Option<&str>) -> bool {
        !self.shared_secret.is_empty() && candidate == Some(self.shared_secret.as_str())
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("shared_secret", &"<redacted>")
            .field("github", &self.github)
            .field("llm", &self.llm)
            .finish()
    }
}
