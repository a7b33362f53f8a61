use async_trait::async_trait;

use crate::error::Result;

/// Single-shot text generation: prompt in, text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
