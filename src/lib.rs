//! repo-provision - create a hosted repository and publish a directory to it
//!
//! One operation, [`provision::Provisioner::provision`], in two steps:
//! create the repository through the provider's REST API, then turn the
//! local working directory into a repository that tracks it and push.
//!
//! # Architecture
//!
//! - **types**: Descriptor, credential and result types
//! - **forge**: Remote repository creation (GitHub REST API)
//! - **publish**: Local init/stage/commit/remote/push via the git CLI
//! - **provision**: The two-step saga and manual fallback instructions
//! - **config**: Optional YAML configuration and input validation
//! - **commands**: Command-line surface

pub mod commands;
pub mod config;
pub mod error;
pub mod forge;
pub mod logging;
pub mod provision;
pub mod publish;
pub mod style;
pub mod types;

// Re-exports
pub use error::{ProvisionError, Result};
pub use provision::{ProvisionFailure, Provisioner, Stage};
pub use types::{
    Credential, ProvisionMode, ProvisionReport, ProvisioningResult, PublishResult, PublishStep,
    RepositoryDescriptor, Visibility,
};
