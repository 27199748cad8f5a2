//! Configuration file handling
//!
//! Loads the optional ~/.config/repo-provision/config.yaml. Every value can
//! also be given on the command line; the file only supplies defaults. The
//! API token is never part of the file.

use crate::types::{RepositoryDescriptor, Visibility};
use crate::{ProvisionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to create on the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// Repository name; defaults to the working directory's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

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

    /// License template keyword, empty for none
    #[serde(default)]
    pub license: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            name: None,
            description: String::new(),
            visibility: Visibility::Public,
            enable_issues: true,
            enable_wiki: true,
            enable_projects: true,
            license: String::new(),
            organization: None,
        }
    }
}

/// Local git settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    /// Name of the remote to attach
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Primary branch pushed upstream
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Message for the commit created during full setup
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Written to the repository's local `user.name` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Written to the repository's local `user.email` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_commit_message() -> String {
    "Initial commit".to_string()
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            commit_message: default_commit_message(),
            author_name: None,
            author_email: None,
        }
    }
}

/// Provider API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// `https://api.github.com`, or a GitHub Enterprise host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// repo-provision configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub repository: RepositorySettings,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub api: ApiSettings,

    /// Directory to publish; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
}

impl ProvisionConfig {
    /// Create a configuration with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an explicit file, or the default file if it exists, or defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    Ok(Self::new())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProvisionError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            remote = %config.git.remote,
            branch = %config.git.branch,
            base_url = %config.api.base_url,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Get the default config path (~/.config/repo-provision/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("repo-provision");
        path.push("config.yaml");
        path
    }

    /// Directory to publish, resolved against the current directory
    pub fn working_directory(&self) -> Result<PathBuf> {
        let dir = match self.working_directory {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => std::env::current_dir()?.join(dir),
            None => std::env::current_dir()?,
        };
        Ok(dir)
    }

    /// Build the descriptor, naming the repository after `working_directory`
    /// when no name is configured
    pub fn descriptor(&self, working_directory: &Path) -> Result<RepositoryDescriptor> {
        let name = match self.repository.name {
            Some(ref name) => name.clone(),
            None => working_directory
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ProvisionError::Usage(format!(
                        "cannot derive a repository name from {}; pass --name",
                        working_directory.display()
                    ))
                })?,
        };

        let settings = &self.repository;
        let descriptor = RepositoryDescriptor {
            name,
            description: settings.description.clone(),
            visibility: settings.visibility,
            enable_issues: settings.enable_issues,
            enable_wiki: settings.enable_wiki,
            enable_projects: settings.enable_projects,
            license: settings.license.clone(),
            auto_init: false,
            organization: settings.organization.clone(),
        };

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Per-request timeout for the provider API
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = ProvisionConfig::new();
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.api.base_url, "https://api.github.com");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.repository.name.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "repository:\n  description: Sync tasks\n  visibility: private\ngit:\n  author_name: Dev\n";
        let config: ProvisionConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.repository.description, "Sync tasks");
        assert_eq!(config.repository.visibility, Visibility::Private);
        assert!(config.repository.enable_wiki);
        assert_eq!(config.git.author_name.as_deref(), Some("Dev"));
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_round_trips_serialized_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = ProvisionConfig::new();
        config.repository.name = Some("demo".to_string());
        config.git.branch = "trunk".to_string();
        fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = ProvisionConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ProvisionConfig::load_or_default(Some(&dir.path().join("absent.yaml")));
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_descriptor_from_directory_name() {
        let config = ProvisionConfig::new();
        let descriptor = config.descriptor(Path::new("/home/dev/monday-automation")).unwrap();
        assert_eq!(descriptor.name, "monday-automation");
        assert_eq!(descriptor.visibility, Visibility::Public);
        assert!(!descriptor.auto_init);
    }

    #[test]
    fn test_descriptor_prefers_configured_name() {
        let mut config = ProvisionConfig::new();
        config.repository.name = Some("demo".to_string());
        config.repository.organization = Some("acme".to_string());

        let descriptor = config.descriptor(Path::new("/tmp/whatever")).unwrap();
        assert_eq!(descriptor.name, "demo");
        assert_eq!(descriptor.organization.as_deref(), Some("acme"));
    }

    #[test]
    fn test_descriptor_rejects_invalid_directory_name() {
        let config = ProvisionConfig::new();
        let result = config.descriptor(Path::new("/tmp/has space"));
        assert!(matches!(result, Err(ProvisionError::Usage(_))));
    }
}
