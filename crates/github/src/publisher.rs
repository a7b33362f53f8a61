//! Publishing generated files into a repository.
//!
//! Each file's version lookup immediately precedes its own write, so the
//! token sent with an update is the one current at write time. Two rounds
//! publishing to the same repository concurrently can still interleave
//! between lookup and write; the provider then rejects the second write
//! with a conflict, which surfaces as a failed publish.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use taskpub_core::{FileContent, GeneratedFile, Round, VersionToken};
use tracing::{info, warn};

use crate::error::{GitHubError, Result};
use crate::provider::HostingProvider;
use crate::types::{PutFileRequest, WriteOutcome};

/// Files written (or skipped) by one publish call, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

impl PublishReport {
    pub fn written(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

pub struct RepositoryPublisher<'a> {
    provider: &'a dyn HostingProvider,
    branch: &'a str,
}

impl<'a> RepositoryPublisher<'a> {
    pub fn new(provider: &'a dyn HostingProvider, branch: &'a str) -> Self {
        Self { provider, branch }
    }

    /// Version token of `path`, `None` for a file that does not exist yet.
    pub async fn lookup_version(&self, repo: &str, path: &str) -> Result<Option<VersionToken>> {
        self.provider
            .get_file_version(repo, path, self.branch)
            .await
            .map_err(|source| GitHubError::FileLookup {
                repo: repo.to_string(),
                path: path.to_string(),
                source: Box::new(source),
            })
    }

    /// Writes `files` in order. The first failing file aborts the batch.
    pub async fn publish(
        &self,
        repo: &str,
        files: &[GeneratedFile],
        round: Round,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for file in files {
            let content = match &file.content {
                Some(content) if !file.name.trim().is_empty() => content,
                _ => {
                    warn!(
                        name = %file.name,
                        has_content = file.content.is_some(),
                        "Skipping file due to missing name or content"
                    );
                    report.skipped.push(file.name.clone());
                    continue;
                }
            };

            let sha = self.lookup_version(repo, &file.name).await?;
            match &sha {
                Some(token) => info!(
                    "File {} exists, updating with SHA: {}...",
                    file.name,
                    token.short()
                ),
                None => info!("File {} is new, creating without SHA", file.name),
            }

            let request = PutFileRequest {
                repo: repo.to_string(),
                path: file.name.clone(),
                content: encode_content(content),
                message: commit_message(&file.name, round),
                branch: self.branch.to_string(),
                sha,
            };

            let outcome =
                self.provider
                    .put_file(&request)
                    .await
                    .map_err(|source| GitHubError::FilePush {
                        path: file.name.clone(),
                        source: Box::new(source),
                    })?;

            info!("File '{}' {} successfully", file.name, outcome.as_str());
            match outcome {
                WriteOutcome::Created => report.created.push(file.name.clone()),
                WriteOutcome::Updated => report.updated.push(file.name.clone()),
            }
        }

        Ok(report)
    }
}

pub fn commit_message(file_name: &str, round: Round) -> String {
    format!("Add/Update {} for Round {}", file_name, round.number())
}

pub fn encode_content(content: &FileContent) -> String {
    STANDARD.encode(content.as_bytes())
}
