use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of the remote repository that holds one task's artifacts across
/// both rounds. Always rendered as `{task}-{nonce}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    task: String,
    nonce: String,
}

impl RepoIdentity {
    pub const SEPARATOR: char = '-';

    pub fn new(task: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            nonce: nonce.into(),
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn repo_name(&self) -> String {
        format!("{}{}{}", self.task, Self::SEPARATOR, self.nonce)
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.task, Self::SEPARATOR, self.nonce)
    }
}

/// Opaque revision marker of one stored file. The hosting provider requires
/// the current one to overwrite a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
