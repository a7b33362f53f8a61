//! Turns a task brief into the files of a small static web application.

pub mod client;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod parser;
pub mod prompts;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{ChatClient, LlmConfig};
pub use error::{GenerationError, Result};
pub use fallback::fallback_files;
pub use generator::{ContentGenerator, Generation, GenerationSource};
pub use parser::{parse_generated_files, strip_code_fences};
pub use prompts::GenerationPrompts;
pub use provider::CompletionProvider;
