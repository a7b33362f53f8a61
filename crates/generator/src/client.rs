use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::error::{GenerationError, Result};
use crate::provider::CompletionProvider;
use crate::types::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

pub const DEFAULT_BASE_URL: &str = "https://aipipe.org/openai/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    /// Without a key every completion fails with [`GenerationError::MissingApiKey`].
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl LlmConfig {
    /// Full completions endpoint. A base URL that already names the
    /// endpoint is used as is.
    pub fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with(COMPLETIONS_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, COMPLETIONS_PATH)
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

/// Client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        debug!(
            "Creating chat completion with {} messages, model {}",
            messages.len(),
            self.config.model
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: None,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ApiErrorBody>(&error_text) {
                error!(
                    "Generation API error: {} (type: {:?})",
                    error_resp.error.message, error_resp.error.error_type
                );
                return Err(GenerationError::Api {
                    message: error_resp.error.message,
                    status_code: Some(status.as_u16()),
                });
            }

            error!("Generation API returned status {}", status);
            return Err(GenerationError::Api {
                message: error_text,
                status_code: Some(status.as_u16()),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyCompletion)
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat_completion(vec![ChatMessage::user(prompt)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_completions_url_appends_path() {
        assert_eq!(
            config("https://aipipe.org/openai/v1").completions_url(),
            "https://aipipe.org/openai/v1/chat/completions"
        );
        assert_eq!(
            config("https://aipipe.org/openai/v1/").completions_url(),
            "https://aipipe.org/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_kept_when_complete() {
        assert_eq!(
            config("https://proxy.local/v1/chat/completions").completions_url(),
            "https://proxy.local/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = LlmConfig {
            api_key: Some("sk-live".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-live"));
        assert!(debug.contains("gpt-4o"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = ChatClient::new(config("http://127.0.0.1:9"));
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
