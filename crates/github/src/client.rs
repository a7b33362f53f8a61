use async_trait::async_trait;
use http::header::HeaderName;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde_json::Value;
use taskpub_core::VersionToken;
use tracing::{debug, info};

use crate::error::{GitHubError, Result};
use crate::provider::HostingProvider;
use crate::types::{
    CreateRepoRequest, CreatedRepository, EnablePagesRequest, GitHubConfig, HostingOutcome,
    PagesSource, PutFileBody, PutFileRequest, WriteOutcome,
};

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// REST client for the GitHub API, scoped to one owning account.
///
/// Calls go through octocrab's raw request methods so the exact status of
/// every answer stays visible: 404 on a contents lookup means "absent",
/// 409 on pages means "already enabled", 201 and 200 on a write tell a
/// create from an update.
#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(GitHubError::Config("GitHub token is empty".to_string()));
        }
        if config.owner.trim().is_empty() {
            return Err(GitHubError::Config("GitHub owner is empty".to_string()));
        }

        let octocrab = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(config.api_url.as_str())
            .map_err(|e| GitHubError::Config(format!("Invalid API URL: {}", e)))?
            .add_header(
                HeaderName::from_static(API_VERSION_HEADER),
                API_VERSION.to_string(),
            )
            .add_retry_config(RetryConfig::None)
            .build()
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self { octocrab, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn api_base(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    fn repo_url(&self, repo: &str, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_base(),
            self.config.owner,
            repo,
            suffix
        )
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        let encoded = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        self.repo_url(repo, &format!("/contents/{}", encoded))
    }
}

#[async_trait]
impl HostingProvider for GitHubClient {
    async fn create_repository(&self, name: &str) -> Result<CreatedRepository> {
        info!("Creating repository {}/{}", self.config.owner, name);

        let response = self
            .octocrab
            ._post(
                format!("{}/user/repos", self.api_base()),
                Some(&CreateRepoRequest::public(name)),
            )
            .await?;
        let status = response.status().as_u16();
        let body = self.octocrab.body_to_string(response).await?;

        if status != 201 {
            return Err(GitHubError::api(status, body));
        }

        let repo: CreatedRepository = serde_json::from_str(&body)?;
        debug!(id = repo.id, url = %repo.html_url, "Repository created");
        Ok(repo)
    }

    async fn get_file_version(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<VersionToken>> {
        debug!("Looking up version of {} in {} on {}", path, repo, branch);

        let url = format!(
            "{}?ref={}",
            self.contents_url(repo, path),
            urlencoding::encode(branch)
        );
        let response = self.octocrab._get(url).await?;
        let status = response.status().as_u16();
        let body = self.octocrab.body_to_string(response).await?;

        match status {
            200 => {
                let metadata: Value = serde_json::from_str(&body)?;
                metadata
                    .get("sha")
                    .and_then(Value::as_str)
                    .map(|sha| Some(VersionToken::new(sha)))
                    .ok_or_else(|| {
                        GitHubError::Decode(format!("No sha in contents metadata for '{}'", path))
                    })
            }
            404 => Ok(None),
            _ => Err(GitHubError::api(status, body)),
        }
    }

    async fn put_file(&self, request: &PutFileRequest) -> Result<WriteOutcome> {
        debug!(
            "Writing {} to {} ({})",
            request.path,
            request.repo,
            if request.sha.is_some() { "update" } else { "create" }
        );

        let response = self
            .octocrab
            ._put(
                self.contents_url(&request.repo, &request.path),
                Some(&PutFileBody::from(request)),
            )
            .await?;
        let status = response.status().as_u16();

        match status {
            201 => Ok(WriteOutcome::Created),
            200 => Ok(WriteOutcome::Updated),
            _ => {
                let body = self.octocrab.body_to_string(response).await?;
                Err(GitHubError::api(status, body))
            }
        }
    }

    async fn enable_static_hosting(
        &self,
        repo: &str,
        source: &PagesSource,
    ) -> Result<HostingOutcome> {
        debug!(
            "Enabling pages for {} from {}:{}",
            repo, source.branch, source.path
        );

        let response = self
            .octocrab
            ._post(
                self.repo_url(repo, "/pages"),
                Some(&EnablePagesRequest { source }),
            )
            .await?;
        let status = response.status().as_u16();

        match status {
            201 | 204 => Ok(HostingOutcome::Enabled),
            409 => Ok(HostingOutcome::AlreadyEnabled),
            _ => {
                let body = self.octocrab.body_to_string(response).await?;
                Err(GitHubError::api(status, body))
            }
        }
    }
}
