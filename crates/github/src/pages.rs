use tracing::info;

use crate::error::Result;
use crate::provider::HostingProvider;
use crate::types::{HostingOutcome, PagesSource};

/// Serves the root of `branch` as a public static site. A site that is
/// already configured counts as success.
pub async fn enable_static_hosting(
    provider: &dyn HostingProvider,
    repo: &str,
    branch: &str,
) -> Result<HostingOutcome> {
    info!("Enabling GitHub Pages for: {}", repo);

    let outcome = provider
        .enable_static_hosting(repo, &PagesSource::root(branch))
        .await?;

    match outcome {
        HostingOutcome::Enabled => info!("GitHub Pages enabled successfully for {}", repo),
        HostingOutcome::AlreadyEnabled => info!("GitHub Pages for {} already enabled", repo),
    }

    Ok(outcome)
}

pub fn pages_url(owner: &str, repo: &str) -> String {
    format!("https://{}.github.io/{}/", owner, repo)
}
