use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::state_machine::FlowStep;

pub const ROUND1_MESSAGE: &str = "Round 1 processing complete";
pub const ROUND2_MESSAGE: &str = "Round 2 code modification complete";

const FEEDBACK_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Round1Summary {
    pub message: String,
    pub repo_name: String,
    pub repo_url: String,
    pub pages_url: String,
    pub files_created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Round2Summary {
    pub message: String,
    pub repo_name: String,
    pub files_updated: usize,
    pub feedback_applied: String,
}

impl Round2Summary {
    pub fn new(repo_name: impl Into<String>, files_updated: usize, feedback: &str) -> Self {
        Self {
            message: ROUND2_MESSAGE.to_string(),
            repo_name: repo_name.into(),
            files_updated,
            feedback_applied: feedback_preview(feedback),
        }
    }
}

/// Error payload. Only the fields that apply are serialized, so an auth
/// failure is exactly `{"error": "Invalid secret"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<FlowStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_steps: Vec<FlowStep>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            repo_name: None,
            failed_step: None,
            completed_steps: Vec::new(),
        }
    }
}

impl From<&OrchestratorError> for ErrorResponse {
    fn from(err: &OrchestratorError) -> Self {
        match err {
            OrchestratorError::Step {
                step,
                completed,
                repo_name,
                source,
            } => Self {
                error: source.to_string(),
                repo_name: Some(repo_name.clone()),
                failed_step: Some(*step),
                completed_steps: completed.clone(),
            },
            other => Self::new(other.to_string()),
        }
    }
}

/// Successful outcome of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundSummary {
    Initial(Round1Summary),
    Revision(Round2Summary),
}

/// Body of every `/handle_task` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum TaskResponse {
    Initial(Round1Summary),
    Revision(Round2Summary),
    Error(ErrorResponse),
}

impl TaskResponse {
    pub fn error(message: impl Into<String>) -> Self {
        TaskResponse::Error(ErrorResponse::new(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TaskResponse::Error(_))
    }
}

impl From<RoundSummary> for TaskResponse {
    fn from(summary: RoundSummary) -> Self {
        match summary {
            RoundSummary::Initial(s) => TaskResponse::Initial(s),
            RoundSummary::Revision(s) => TaskResponse::Revision(s),
        }
    }
}

impl From<OrchestratorError> for TaskResponse {
    fn from(err: OrchestratorError) -> Self {
        TaskResponse::Error(ErrorResponse::from(&err))
    }
}

/// First 100 characters of the feedback, with `...` appended when cut.
pub fn feedback_preview(feedback: &str) -> String {
    match feedback.char_indices().nth(FEEDBACK_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &feedback[..cut]),
        None => feedback.to_string(),
    }
}
