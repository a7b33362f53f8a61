use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid round")]
    InvalidRound,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed request: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
