//! Remote repository hosting
//!
//! The provider side of provisioning: one authenticated request that
//! creates the repository. GitHub (and GitHub Enterprise) is the only
//! implementation.

pub mod github;

use crate::types::{Credential, ProvisioningResult, RepositoryDescriptor};
use crate::Result;
use async_trait::async_trait;

pub use github::{new_repository_page, CreateRepositoryRequest, GitHubClient, DEFAULT_TIMEOUT};

/// Something that can create a repository on a provider
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Create the repository described by `descriptor`
    ///
    /// Sends exactly one request and never retries. A non-success status is
    /// [`crate::ProvisionError::RemoteRejected`] carrying the raw body; a
    /// transport failure is [`crate::ProvisionError::Network`].
    async fn create_remote(
        &self,
        credential: &Credential,
        descriptor: &RepositoryDescriptor,
    ) -> Result<ProvisioningResult>;
}
