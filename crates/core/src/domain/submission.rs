use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::repository::RepoIdentity;
use crate::error::{CoreError, Result};

pub const DEFAULT_BRIEF: &str = "Create a simple static web application";
pub const DEFAULT_FEEDBACK: &str = "Fix issues and improve the implementation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Task submission as it arrives on the wire. Nothing here is trusted until
/// [`TaskSubmission::into_round_request`] has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskSubmission {
    pub email: Option<String>,
    pub secret: Option<String>,
    pub task: Option<String>,
    /// Must be the integer 1 or 2.
    #[schema(value_type = Option<i64>)]
    pub round: Option<Value>,
    pub nonce: Option<String>,
    pub brief: Option<String>,
    #[serde(default)]
    pub checks: Vec<String>,
    pub evaluation_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub evaluation_feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    Initial,
    Revision,
}

impl Round {
    pub fn number(&self) -> u8 {
        match self {
            Round::Initial => 1,
            Round::Revision => 2,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_i64() {
            Some(1) => Some(Round::Initial),
            Some(2) => Some(Round::Revision),
            _ => None,
        }
    }
}

/// Fields both rounds share once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    pub identity: RepoIdentity,
    pub brief: String,
    pub checks: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub email: Option<String>,
    pub evaluation_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round1Request {
    pub context: TaskContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round2Request {
    pub context: TaskContext,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundRequest {
    Initial(Round1Request),
    Revision(Round2Request),
}

impl RoundRequest {
    pub fn round(&self) -> Round {
        match self {
            RoundRequest::Initial(_) => Round::Initial,
            RoundRequest::Revision(_) => Round::Revision,
        }
    }

    pub fn context(&self) -> &TaskContext {
        match self {
            RoundRequest::Initial(req) => &req.context,
            RoundRequest::Revision(req) => &req.context,
        }
    }
}

impl TaskSubmission {
    /// Reads a submission out of an already parsed JSON body. Wrongly typed
    /// fields are reported as a malformed request.
    pub fn from_json(body: Value) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| CoreError::Malformed(e.to_string()))
    }

    pub fn round(&self) -> Result<Round> {
        self.round
            .as_ref()
            .and_then(Round::from_value)
            .ok_or(CoreError::InvalidRound)
    }

    /// Validates the submission into the request shape of its round.
    /// The round is checked before the required fields.
    pub fn into_round_request(self) -> Result<RoundRequest> {
        let round = self.round()?;

        let task = required(self.task, "task")?;
        let nonce = required(self.nonce, "nonce")?;

        let brief = self
            .brief
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BRIEF.to_string());

        let context = TaskContext {
            identity: RepoIdentity::new(task, nonce),
            brief,
            checks: self.checks,
            attachments: self.attachments,
            email: self.email,
            evaluation_url: self.evaluation_url,
        };

        Ok(match round {
            Round::Initial => RoundRequest::Initial(Round1Request { context }),
            Round::Revision => {
                let feedback = self
                    .evaluation_feedback
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FEEDBACK.to_string());
                RoundRequest::Revision(Round2Request { context, feedback })
            }
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(CoreError::MissingField(field)),
    }
}
