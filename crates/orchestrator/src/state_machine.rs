use std::fmt;

use serde::{Deserialize, Serialize};
use taskpub_core::Round;

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    GenerateFiles,
    CreateRepository,
    EnableHosting,
    PublishFiles,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::GenerateFiles => "generate_files",
            FlowStep::CreateRepository => "create_repository",
            FlowStep::EnableHosting => "enable_hosting",
            FlowStep::PublishFiles => "publish_files",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INITIAL_STEPS: &[FlowStep] = &[
    FlowStep::GenerateFiles,
    FlowStep::CreateRepository,
    FlowStep::EnableHosting,
    FlowStep::PublishFiles,
];

const REVISION_STEPS: &[FlowStep] = &[FlowStep::GenerateFiles, FlowStep::PublishFiles];

/// Step order of each round's flow. Nothing here survives a request; the
/// repository itself is the only durable state.
pub struct FlowStateMachine;

impl FlowStateMachine {
    pub fn steps(round: Round) -> &'static [FlowStep] {
        match round {
            Round::Initial => INITIAL_STEPS,
            Round::Revision => REVISION_STEPS,
        }
    }

    /// Step following `current`; `None` as `current` means the flow has not
    /// started yet.
    pub fn next_step(round: Round, current: Option<FlowStep>) -> Option<FlowStep> {
        let steps = Self::steps(round);
        match current {
            None => steps.first().copied(),
            Some(step) => {
                let idx = steps.iter().position(|s| *s == step)?;
                steps.get(idx + 1).copied()
            }
        }
    }

    pub fn validate_transition(round: Round, from: Option<FlowStep>, to: FlowStep) -> Result<()> {
        if Self::next_step(round, from) == Some(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.map_or("start", |s| s.as_str()).to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

/// Steps of one round's flow that have finished, in order.
#[derive(Debug, Clone)]
pub struct FlowProgress {
    round: Round,
    completed: Vec<FlowStep>,
}

impl FlowProgress {
    pub fn new(round: Round) -> Self {
        Self {
            round,
            completed: Vec::new(),
        }
    }

    pub fn completed(&self) -> &[FlowStep] {
        &self.completed
    }

    pub fn last(&self) -> Option<FlowStep> {
        self.completed.last().copied()
    }

    pub fn complete(&mut self, step: FlowStep) -> Result<()> {
        FlowStateMachine::validate_transition(self.round, self.last(), step)?;
        self.completed.push(step);
        Ok(())
    }
}
