use std::fmt;

use serde::{Deserialize, Serialize};
use taskpub_core::VersionToken;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

// =============================================================================
// Configuration
// =============================================================================

/// Credentials and account identity for the hosting provider.
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// Account that owns every repository this agent creates.
    pub owner: String,
    pub api_url: String,
    pub default_branch: String,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            api_url: DEFAULT_API_URL.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("api_url", &self.api_url)
            .field("default_branch", &self.default_branch)
            .finish()
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoRequest<'a> {
    pub name: &'a str,
    pub private: bool,
    pub auto_init: bool,
    pub license_template: &'a str,
}

impl<'a> CreateRepoRequest<'a> {
    /// Public repository with an initial commit and an MIT license.
    pub fn public(name: &'a str) -> Self {
        Self {
            name,
            private: false,
            auto_init: true,
            license_template: "mit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRepository {
    pub id: u64,
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

// =============================================================================
// Contents
// =============================================================================

/// A create-or-update write of one file. Carrying a `sha` marks an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileRequest {
    pub repo: String,
    pub path: String,
    /// Base64 of the file bytes.
    pub content: String,
    pub message: String,
    pub branch: String,
    pub sha: Option<VersionToken>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutFileBody<'a> {
    pub message: &'a str,
    pub content: &'a str,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

impl<'a> From<&'a PutFileRequest> for PutFileBody<'a> {
    fn from(req: &'a PutFileRequest) -> Self {
        Self {
            message: &req.message,
            content: &req.content,
            branch: &req.branch,
            sha: req.sha.as_ref().map(VersionToken::as_str),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Created,
    Updated,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Updated => "updated",
        }
    }
}

// =============================================================================
// Pages
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagesSource {
    pub branch: String,
    pub path: String,
}

impl PagesSource {
    /// Serve the root of `branch`.
    pub fn root(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnablePagesRequest<'a> {
    pub source: &'a PagesSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostingOutcome {
    Enabled,
    AlreadyEnabled,
}
