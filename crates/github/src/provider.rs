use async_trait::async_trait;
use taskpub_core::VersionToken;

use crate::error::Result;
use crate::types::{CreatedRepository, HostingOutcome, PagesSource, PutFileRequest, WriteOutcome};

/// Remote source-hosting provider. Every method maps one REST call; a
/// non-success response is returned as [`crate::GitHubError::Api`].
#[async_trait]
pub trait HostingProvider: Send + Sync {
    async fn create_repository(&self, name: &str) -> Result<CreatedRepository>;

    /// Current version token of `path` on `branch`, or `None` if the file
    /// does not exist.
    async fn get_file_version(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<VersionToken>>;

    async fn put_file(&self, request: &PutFileRequest) -> Result<WriteOutcome>;

    /// "Already enabled" answers `Ok(HostingOutcome::AlreadyEnabled)`.
    async fn enable_static_hosting(
        &self,
        repo: &str,
        source: &PagesSource,
    ) -> Result<HostingOutcome>;
}
