//! In-memory [`HostingProvider`] that follows GitHub's status semantics.
//! Enabled with the `test-util` feature.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use taskpub_core::VersionToken;

use crate::error::{GitHubError, Result};
use crate::provider::HostingProvider;
use crate::types::{CreatedRepository, HostingOutcome, PagesSource, PutFileRequest, WriteOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    CreateRepository,
    GetFileVersion,
    PutFile,
    EnableHosting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreateRepository {
        name: String,
    },
    GetFileVersion {
        repo: String,
        path: String,
        branch: String,
    },
    PutFile {
        repo: String,
        path: String,
        branch: String,
        message: String,
        sha: Option<String>,
    },
    EnableHosting {
        repo: String,
        branch: String,
        path: String,
    },
}

impl HostCall {
    pub fn op(&self) -> HostOp {
        match self {
            HostCall::CreateRepository { .. } => HostOp::CreateRepository,
            HostCall::GetFileVersion { .. } => HostOp::GetFileVersion,
            HostCall::PutFile { .. } => HostOp::PutFile,
            HostCall::EnableHosting { .. } => HostOp::EnableHosting,
        }
    }
}

/// Provider error returned for every matching call.
#[derive(Debug, Clone)]
pub struct Failure {
    op: HostOp,
    path: Option<String>,
    status: u16,
    body: String,
}

impl Failure {
    pub fn on(op: HostOp, status: u16, body: impl Into<String>) -> Self {
        Self {
            op,
            path: None,
            status,
            body: body.into(),
        }
    }

    /// Restrict a file operation failure to one path.
    pub fn for_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn matches(&self, op: HostOp, path: Option<&str>) -> bool {
        self.op == op
            && match (&self.path, path) {
                (Some(expected), Some(actual)) => expected == actual,
                (Some(_), None) => false,
                (None, _) => true,
            }
    }
}

#[derive(Debug, Default)]
struct StoredFile {
    bytes: Vec<u8>,
    sha: String,
}

#[derive(Debug, Default)]
struct MemoryRepo {
    files: HashMap<String, StoredFile>,
    pages: bool,
}

#[derive(Debug, Default)]
struct State {
    repos: HashMap<String, MemoryRepo>,
    calls: Vec<HostCall>,
    failures: Vec<Failure>,
    revision: u64,
}

impl State {
    fn next_sha(&mut self) -> String {
        self.revision += 1;
        format!("{:040x}", self.revision)
    }

    fn injected(&self, op: HostOp, path: Option<&str>) -> Result<()> {
        match self.failures.iter().find(|f| f.matches(op, path)) {
            Some(f) => Err(GitHubError::api(f.status, f.body.clone())),
            None => Ok(()),
        }
    }
}

fn not_found() -> GitHubError {
    GitHubError::api(404, r#"{"message":"Not Found"}"#)
}

pub struct MemoryHost {
    owner: String,
    default_branch: String,
    state: Mutex<State>,
}

impl MemoryHost {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            default_branch: "main".to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Branch reported for newly created repositories.
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn inject(&self, failure: Failure) {
        self.state().failures.push(failure);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn repo_exists(&self, name: &str) -> bool {
        self.state().repos.contains_key(name)
    }

    pub fn pages_enabled(&self, name: &str) -> bool {
        self.state().repos.get(name).is_some_and(|r| r.pages)
    }

    pub fn file(&self, repo: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .repos
            .get(repo)
            .and_then(|r| r.files.get(path))
            .map(|f| f.bytes.clone())
    }

    /// Store a file directly, as if committed by someone else. Creates the
    /// repository when missing.
    pub fn seed_file(&self, repo: &str, path: &str, content: impl AsRef<[u8]>) {
        let mut state = self.state();
        let sha = state.next_sha();
        let entry = state.repos.entry(repo.to_string()).or_default();
        entry.files.insert(
            path.to_string(),
            StoredFile {
                bytes: content.as_ref().to_vec(),
                sha,
            },
        );
    }
}

#[async_trait]
impl HostingProvider for MemoryHost {
    async fn create_repository(&self, name: &str) -> Result<CreatedRepository> {
        let mut state = self.state();
        state.calls.push(HostCall::CreateRepository {
            name: name.to_string(),
        });
        state.injected(HostOp::CreateRepository, None)?;

        if state.repos.contains_key(name) {
            return Err(GitHubError::api(
                422,
                r#"{"message":"Repository creation failed.","errors":[{"message":"name already exists on this account"}]}"#,
            ));
        }

        let id = state.repos.len() as u64 + 1;
        state.repos.insert(name.to_string(), MemoryRepo::default());

        Ok(CreatedRepository {
            id,
            name: name.to_string(),
            html_url: format!("https://github.com/{}/{}", self.owner, name),
            default_branch: Some(self.default_branch.clone()),
        })
    }

    async fn get_file_version(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<VersionToken>> {
        let mut state = self.state();
        state.calls.push(HostCall::GetFileVersion {
            repo: repo.to_string(),
            path: path.to_string(),
            branch: branch.to_string(),
        });
        state.injected(HostOp::GetFileVersion, Some(path))?;

        Ok(state
            .repos
            .get(repo)
            .and_then(|r| r.files.get(path))
            .map(|f| VersionToken::new(f.sha.clone())))
    }

    async fn put_file(&self, request: &PutFileRequest) -> Result<WriteOutcome> {
        let mut state = self.state();
        state.calls.push(HostCall::PutFile {
            repo: request.repo.clone(),
            path: request.path.clone(),
            branch: request.branch.clone(),
            message: request.message.clone(),
            sha: request.sha.as_ref().map(|t| t.as_str().to_string()),
        });
        state.injected(HostOp::PutFile, Some(&request.path))?;

        let bytes = STANDARD
            .decode(&request.content)
            .map_err(|e| GitHubError::api(422, format!("content is not valid Base64: {}", e)))?;
        let sha = state.next_sha();

        let repo = state.repos.get_mut(&request.repo).ok_or_else(not_found)?;
        let outcome = match (repo.files.get(&request.path), &request.sha) {
            (Some(existing), Some(token)) if existing.sha == token.as_str() => {
                WriteOutcome::Updated
            }
            (Some(_), None) => {
                return Err(GitHubError::api(
                    422,
                    r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#,
                ))
            }
            (Some(existing), Some(_)) => {
                return Err(GitHubError::api(
                    409,
                    format!(
                        r#"{{"message":"{} does not match {}"}}"#,
                        request.path, existing.sha
                    ),
                ))
            }
            (None, Some(_)) => {
                return Err(GitHubError::api(
                    409,
                    format!(r#"{{"message":"{} does not exist"}}"#, request.path),
                ))
            }
            (None, None) => WriteOutcome::Created,
        };

        repo.files
            .insert(request.path.clone(), StoredFile { bytes, sha });
        Ok(outcome)
    }

    async fn enable_static_hosting(
        &self,
        repo: &str,
        source: &PagesSource,
    ) -> Result<HostingOutcome> {
        let mut state = self.state();
        state.calls.push(HostCall::EnableHosting {
            repo: repo.to_string(),
            branch: source.branch.clone(),
            path: source.path.clone(),
        });
        state.injected(HostOp::EnableHosting, None)?;

        let entry = state.repos.get_mut(repo).ok_or_else(not_found)?;
        if entry.pages {
            return Ok(HostingOutcome::AlreadyEnabled);
        }
        entry.pages = true;
        Ok(HostingOutcome::Enabled)
    }
}
