//! Core data model
//!
//! Everything here lives for a single invocation: the descriptor and
//! credential go in, the provisioning and publish results come out.

use crate::config::validation;
use crate::{ProvisionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository visibility on the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// What to create on the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_true")]
    pub enable_issues: bool,
    #[serde(default = "default_true")]
    pub enable_wiki: bool,
    #[serde(default = "default_true")]
    pub enable_projects: bool,
    /// License template keyword (`mit`, `apache-2.0`); empty for none
    #[serde(default)]
    pub license: String,
    /// Let the provider create an initial commit
    #[serde(default)]
    pub auto_init: bool,
    /// Create under this organization instead of the authenticated user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RepositoryDescriptor {
    /// Descriptor with the provider's usual defaults: public, issues, wiki
    /// and projects enabled, no license, no initial commit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            visibility: Visibility::Public,
            enable_issues: true,
            enable_wiki: true,
            enable_projects: true,
            license: String::new(),
            auto_init: false,
            organization: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Check the name (and organization, if any) before any request is sent
    pub fn validate(&self) -> Result<()> {
        validation::validate_repository_name(&self.name)?;
        if let Some(ref org) = self.organization {
            validation::validate_owner(org)?;
        }
        Ok(())
    }
}

/// Bearer token for the provider API
///
/// The token is only reachable through [`Credential::expose`]; formatting
/// the value prints a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting empty or whitespace-only input
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProvisionError::Usage(
                "a non-empty API token is required".to_string(),
            ));
        }
        Ok(Self(token.trim().to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Outcome of the remote creation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningResult {
    /// Canonical (browser) URL of the repository
    pub remote_url: String,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
    /// `owner/name` as reported by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Steps of the local publish sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    Initialize,
    Configure,
    Stage,
    Commit,
    AttachRemote,
    RenameBranch,
    Push,
}

impl PublishStep {
    pub const ALL: [PublishStep; 7] = [
        PublishStep::Initialize,
        PublishStep::Configure,
        PublishStep::Stage,
        PublishStep::Commit,
        PublishStep::AttachRemote,
        PublishStep::RenameBranch,
        PublishStep::Push,
    ];
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::Initialize => "init",
            PublishStep::Configure => "config",
            PublishStep::Stage => "add",
            PublishStep::Commit => "commit",
            PublishStep::AttachRemote => "remote",
            PublishStep::RenameBranch => "branch",
            PublishStep::Push => "push",
        };
        f.write_str(name)
    }
}

/// Whether a step did work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: PublishStep,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn completed(step: PublishStep) -> Self {
        Self {
            step,
            status: StepStatus::Completed,
        }
    }

    pub fn skipped(step: PublishStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Outcome of the local publish step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub remote_url: String,
    pub branch: String,
    /// HEAD after the run, `None` if the repository has no commits
    pub commit: Option<String>,
    /// Every step considered, in the order it was considered
    pub steps: Vec<StepOutcome>,
}

impl PublishResult {
    /// Whether the given step ran (as opposed to being skipped or not reached)
    pub fn ran(&self, step: PublishStep) -> bool {
        self.steps.iter().any(|s| s.step == step && s.is_completed())
    }

    /// Whether this run created a commit
    pub fn committed(&self) -> bool {
        self.ran(PublishStep::Commit)
    }

    /// Steps that actually ran, in order
    pub fn completed_steps(&self) -> Vec<PublishStep> {
        self.steps
            .iter()
            .filter(|s| s.is_completed())
            .map(|s| s.step)
            .collect()
    }
}

/// Which part of the local sequence to perform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionMode {
    /// Initialize, stage, commit, attach the remote and push
    #[default]
    FullSetup,
    /// The directory is already a repository; attach the remote and push
    PushOnly,
}

/// Everything a successful provisioning run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub remote: ProvisioningResult,
    pub publish: PublishResult,
}
