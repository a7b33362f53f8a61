//! Scripted [`CompletionProvider`] for tests. Enabled with the `test-util`
//! feature.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GenerationError, Result};
use crate::provider::CompletionProvider;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail { status: u16, message: String },
}

/// Answers every prompt with the same reply and records the prompts.
pub struct ScriptedCompletion {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::with(Reply::Text(text.into()))
    }

    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self::with(Reply::Fail {
            status,
            message: message.into(),
        })
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail { status, message } => Err(GenerationError::Api {
                message: message.clone(),
                status_code: Some(*status),
            }),
        }
    }
}
