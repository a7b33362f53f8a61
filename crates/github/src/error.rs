use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Failed to get version of '{path}' in '{repo}': {source}")]
    FileLookup {
        repo: String,
        path: String,
        #[source]
        source: Box<GitHubError>,
    },

    #[error("Failed to push file '{path}': {source}")]
    FilePush {
        path: String,
        #[source]
        source: Box<GitHubError>,
    },
}

impl GitHubError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// HTTP status of the underlying provider response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            GitHubError::FileLookup { source, .. } | GitHubError::FilePush { source, .. } => {
                source.status()
            }
            _ => None,
        }
    }
}

impl From<octocrab::Error> for GitHubError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                GitHubError::api(source.status_code.as_u16(), source.message.clone())
            }
            octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => {
                GitHubError::Decode(err.to_string())
            }
            _ => GitHubError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(err: serde_json::Error) -> Self {
        GitHubError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GitHubError>;
