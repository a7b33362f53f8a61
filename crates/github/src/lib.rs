pub mod client;
pub mod error;
pub mod pages;
pub mod provider;
pub mod publisher;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use pages::{enable_static_hosting, pages_url};
pub use provider::HostingProvider;
pub use publisher::{PublishReport, RepositoryPublisher};
pub use types::{
    CreatedRepository, GitHubConfig, HostingOutcome, PagesSource, PutFileRequest, WriteOutcome,
};
