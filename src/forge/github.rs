//! GitHub repository creation
//!
//! Creates repositories through the REST API (`POST /user/repos` or
//! `POST /orgs/{org}/repos`).

use super::RemoteHost;
use crate::config::ProvisionConfig;
use crate::types::{Credential, ProvisioningResult, RepositoryDescriptor};
use crate::{ProvisionError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("repo-provision/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// GitHub REST client for repository creation
pub struct GitHubClient {
    client: Client,
    rest_base_url: String,
    timeout: Duration,
}

/// Repository creation request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
    pub auto_init: bool,
}

impl From<&RepositoryDescriptor> for CreateRepositoryRequest {
    fn from(descriptor: &RepositoryDescriptor) -> Self {
        let license = descriptor.license.trim();
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            private: descriptor.visibility.is_private(),
            has_issues: descriptor.enable_issues,
            has_wiki: descriptor.enable_wiki,
            has_projects: descriptor.enable_projects,
            license_template: (!license.is_empty()).then(|| license.to_string()),
            auto_init: descriptor.auto_init,
        }
    }
}

/// The parts of the creation response we use
#[derive(Debug, Clone, Deserialize)]
struct CreatedRepository {
    html_url: String,
    #[serde(default)]
    clone_url: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

impl GitHubClient {
    /// Create a client for `base_url`
    ///
    /// `https://github.com` and `https://api.github.com` both resolve to the
    /// public API; a bare enterprise host resolves to `<host>/api/v3`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(USER_AGENT),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers.insert(
                    "x-github-api-version",
                    header::HeaderValue::from_static(API_VERSION),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            rest_base_url: rest_base_url(base_url),
            timeout,
        })
    }

    /// Create a client from the `api` section of the configuration
    pub fn from_config(config: &ProvisionConfig) -> Result<Self> {
        Self::new(&config.api.base_url, config.timeout())
    }

    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }

    /// Endpoint the creation request is sent to
    pub fn creation_url(&self, descriptor: &RepositoryDescriptor) -> String {
        match descriptor.organization {
            Some(ref org) => format!("{}/orgs/{}/repos", self.rest_base_url, org),
            None => format!("{}/user/repos", self.rest_base_url),
        }
    }

    /// Create a repository (REST API)
    pub async fn create_repository(
        &self,
        credential: &Credential,
        descriptor: &RepositoryDescriptor,
    ) -> Result<ProvisioningResult> {
        descriptor.validate()?;

        let url = self.creation_url(descriptor);
        let body = CreateRepositoryRequest::from(descriptor);

        info!(
            name = %descriptor.name,
            visibility = %descriptor.visibility,
            url = %url,
            "Creating repository"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                let created: CreatedRepository = response.json().await?;
                info!(url = %created.html_url, "Repository created");
                Ok(ProvisioningResult {
                    remote_url: created.html_url,
                    created: true,
                    clone_url: created.clone_url,
                    full_name: created.full_name,
                })
            }
            status => {
                let body = response.text().await?;
                warn!(status = %status, "Repository creation rejected");
                debug!(body = %body, "Rejection body");
                Err(ProvisionError::RemoteRejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl RemoteHost for GitHubClient {
    async fn create_remote(
        &self,
        credential: &Credential,
        descriptor: &RepositoryDescriptor,
    ) -> Result<ProvisioningResult> {
        self.create_repository(credential, descriptor).await
    }
}

/// Web page for creating a repository by hand on the same host
pub fn new_repository_page(base_url: &str) -> String {
    let api = rest_base_url(base_url);
    if api == "https://api.github.com" {
        return "https://github.com/new".to_string();
    }
    let web = api.trim_end_matches("/api/v3");
    format!("{}/new", web)
}

fn rest_base_url(base_url: &str) -> String {
    let base_url = base_url.trim().trim_end_matches('/');
    let host_and_path = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let (host, path) = match host_and_path.split_once('/') {
        Some((host, path)) => (host, path),
        None => (host_and_path, ""),
    };

    if host == "github.com" || host == "www.github.com" {
        "https://api.github.com".to_string()
    } else if host == "api.github.com" || !path.is_empty() {
        base_url.to_string()
    } else {
        format!("{}/api/v3", base_url)
    }
}
