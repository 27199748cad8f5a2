//! Configuration system
//!
//! Loads ~/.config/repo-provision/config.yaml (optional) with support for:
//! - Repository descriptor defaults (description, visibility, features)
//! - Git identity, remote and branch names, commit message
//! - Provider API base URL and request timeout
//!
//! Command-line flags override anything read from the file.

mod provision_config;
pub mod validation;

pub use provision_config::{ApiSettings, GitSettings, ProvisionConfig, RepositorySettings};
pub use validation::{validate_config, validate_config_result, ValidationError};
