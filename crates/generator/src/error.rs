use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation API key is not configured")]
    MissingApiKey,

    #[error("Generation API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No completion returned")]
    EmptyCompletion,

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
