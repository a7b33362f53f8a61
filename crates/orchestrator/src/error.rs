use github::GitHubError;
use taskpub_core::CoreError;
use thiserror::Error;

use crate::state_machine::FlowStep;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid secret")]
    InvalidSecret,

    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A provider call failed partway through a round. Steps already
    /// completed are not rolled back.
    #[error("{source}")]
    Step {
        step: FlowStep,
        completed: Vec<FlowStep>,
        repo_name: String,
        #[source]
        source: GitHubError,
    },

    #[error("Invalid flow transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OrchestratorError {
    pub fn step(
        step: FlowStep,
        completed: Vec<FlowStep>,
        repo_name: impl Into<String>,
        source: GitHubError,
    ) -> Self {
        Self::Step {
            step,
            completed,
            repo_name: repo_name.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Status code of the provider response behind a step failure.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            Self::Step { source, .. } => source.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_response_messages() {
        assert_eq!(OrchestratorError::InvalidSecret.to_string(), "Invalid secret");
        assert_eq!(
            OrchestratorError::from(CoreError::InvalidRound).to_string(),
            "Invalid round"
        );
    }

    #[test]
    fn test_step_error_keeps_provider_detail() {
        let err = OrchestratorError::step(
            FlowStep::EnableHosting,
            vec![FlowStep::GenerateFiles, FlowStep::CreateRepository],
            "t1-n1",
            GitHubError::api(403, "Resource not accessible"),
        );
        assert_eq!(err.provider_status(), Some(403));
        assert!(err.to_string().contains("Resource not accessible"));
    }
}
