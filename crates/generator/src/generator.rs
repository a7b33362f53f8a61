use std::sync::Arc;

use taskpub_core::{GeneratedFile, Round, TaskContext, DEFAULT_FEEDBACK};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fallback::fallback_files;
use crate::parser::parse_generated_files;
use crate::prompts::GenerationPrompts;
use crate::provider::CompletionProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSource {
    Model,
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub files: Vec<GeneratedFile>,
    pub source: GenerationSource,
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, GenerationSource::Fallback { .. })
    }
}

/// Content Generator. Never fails: any transport, parse or shape problem
/// yields the built-in fallback files instead.
#[derive(Clone)]
pub struct ContentGenerator {
    provider: Arc<dyn CompletionProvider>,
}

impl ContentGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(
        &self,
        context: &TaskContext,
        round: Round,
        feedback: Option<&str>,
    ) -> Generation {
        let prompt = match round {
            Round::Initial => GenerationPrompts::initial(context),
            Round::Revision => {
                GenerationPrompts::revision(context, feedback.unwrap_or(DEFAULT_FEEDBACK))
            }
        };

        match self.request_files(&prompt).await {
            Ok(files) => {
                info!("Successfully parsed {} files from LLM", files.len());
                Generation {
                    files,
                    source: GenerationSource::Model,
                }
            }
            Err(e) => {
                warn!(error = %e, round = round.number(), "Generation failed, using fallback files");
                Generation {
                    files: fallback_files(),
                    source: GenerationSource::Fallback {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    async fn request_files(&self, prompt: &str) -> Result<Vec<GeneratedFile>> {
        let response = self.provider.complete(prompt).await?;
        info!("LLM response received, parsing...");
        parse_generated_files(&response).map_err(|e| {
            debug!(raw = %response, "Unusable LLM response");
            e
        })
    }
}
