//! Input validation
//!
//! Validates everything that ends up in a request body or on a git command
//! line before any side effect happens:
//! - Repository and owner names the provider will accept
//! - Remote and branch names that git cannot mistake for options
//! - Remote URLs in a form git understands
//! - Sane configuration values

use super::provision_config::ProvisionConfig;
use crate::{ProvisionError, Result};

/// Longest repository name the provider accepts
const MAX_REPOSITORY_NAME: usize = 100;

/// Fields whose bad values are usage errors rather than configuration errors
const USAGE_FIELDS: &[&str] = &[
    "repository.name",
    "repository.organization",
    "git.remote",
    "git.branch",
];

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the bad value names a repository, owner, remote or branch
    pub fn is_usage(&self) -> bool {
        USAGE_FIELDS.contains(&self.field.as_str())
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a configuration after CLI overrides have been applied
pub fn validate_config(config: &ProvisionConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(ref name) = config.repository.name {
        if let Some(message) = repository_name_problem(name) {
            errors.push(ValidationError::new("repository.name", message));
        }
    }

    if let Some(ref org) = config.repository.organization {
        if let Some(message) = owner_problem(org) {
            errors.push(ValidationError::new("repository.organization", message));
        }
    }

    if let Some(message) = ref_name_problem(&config.git.remote) {
        errors.push(ValidationError::new("git.remote", message));
    }

    if let Some(message) = ref_name_problem(&config.git.branch) {
        errors.push(ValidationError::new("git.branch", message));
    }

    if config.git.commit_message.trim().is_empty() {
        errors.push(ValidationError::new(
            "git.commit_message",
            "Commit message must not be empty",
        ));
    }

    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        errors.push(ValidationError::new(
            "api.base_url",
            format!("Expected an http(s) URL, got '{}'", base_url),
        ));
    }

    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "api.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
///
/// Bad names alone yield [`ProvisionError::Usage`]; any other invalid
/// value makes it [`ProvisionError::Config`].
pub fn validate_config_result(config: &ProvisionConfig) -> Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        let messages = messages.join("\n  - ");
        if errors.iter().all(ValidationError::is_usage) {
            ProvisionError::Usage(format!("Invalid arguments:\n  - {}", messages))
        } else {
            ProvisionError::Config(format!(
                "Configuration validation failed:\n  - {}",
                messages
            ))
        }
    })
}

/// Validate a repository name for the creation request
pub fn validate_repository_name(name: &str) -> Result<()> {
    match repository_name_problem(name) {
        Some(message) => Err(ProvisionError::Usage(format!(
            "invalid repository name '{}': {}",
            name, message
        ))),
        None => Ok(()),
    }
}

/// Validate an organization (owner) name
pub fn validate_owner(owner: &str) -> Result<()> {
    match owner_problem(owner) {
        Some(message) => Err(ProvisionError::Usage(format!(
            "invalid organization '{}': {}",
            owner, message
        ))),
        None => Ok(()),
    }
}

/// Validate a remote or branch name passed to git
pub fn validate_ref_name(kind: &str, name: &str) -> Result<()> {
    match ref_name_problem(name) {
        Some(message) => Err(ProvisionError::Usage(format!(
            "invalid {} name '{}': {}",
            kind, name, message
        ))),
        None => Ok(()),
    }
}

/// Validate a remote URL passed to `git remote add`
pub fn validate_remote_url(url: &str) -> Result<()> {
    if is_valid_git_url(url) {
        Ok(())
    } else {
        Err(ProvisionError::Usage(format!(
            "'{}' is not a valid git remote URL",
            url
        )))
    }
}

fn repository_name_problem(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("name must not be empty".to_string());
    }
    if name.contains('/') || name.contains('\\') {
        return Some("name must not contain path separators".to_string());
    }
    if name == "." || name == ".." {
        return Some("name must not be '.' or '..'".to_string());
    }
    if name.len() > MAX_REPOSITORY_NAME {
        return Some(format!(
            "name must be at most {} characters",
            MAX_REPOSITORY_NAME
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Some(format!("character {:?} is not allowed", c));
    }
    None
}

fn owner_problem(owner: &str) -> Option<String> {
    if owner.is_empty() {
        return Some("name must not be empty".to_string());
    }
    if owner.starts_with('-') || owner.ends_with('-') {
        return Some("name must not start or end with '-'".to_string());
    }
    if let Some(c) = owner
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
    {
        return Some(format!("character {:?} is not allowed", c));
    }
    None
}

fn ref_name_problem(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("name must not be empty".to_string());
    }
    if name.starts_with('-') {
        return Some("name must not start with '-'".to_string());
    }
    if name.contains("..") {
        return Some("name must not contain '..'".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(*c))
    {
        return Some(format!("character {:?} is not allowed", c));
    }
    None
}

/// Check if a string is a URL git can use as a remote
fn is_valid_git_url(url: &str) -> bool {
    if url.is_empty() || url.starts_with('-') || url.chars().any(char::is_whitespace) {
        return false;
    }

    // Scheme forms: https://host/..., ssh://git@host/..., file:///path
    if let Some((scheme, rest)) = url.split_once("://") {
        return match scheme {
            "https" | "http" | "ssh" | "git" => {
                let host = rest.split('/').next().unwrap_or_default();
                !host.is_empty()
            }
            "file" => rest.contains('/'),
            _ => false,
        };
    }

    // Local path: /path/to/repo.git
    if url.starts_with('/') {
        return true;
    }

    // SCP-like format: git@github.com:user/repo.git
    if let Some((host, path)) = url.split_once(':') {
        return host.contains('@') && !host.contains('/') && !path.is_empty();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_repository_names() {
        assert!(validate_repository_name("demo").is_ok());
        assert!(validate_repository_name("monday-automation").is_ok());
        assert!(validate_repository_name("my_repo.rs").is_ok());
    }

    #[test]
    fn test_invalid_repository_names() {
        for name in ["", "a/b", "a\\b", ".", "..", "has space", "quote\"d"] {
            assert!(
                matches!(validate_repository_name(name), Err(ProvisionError::Usage(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert!(validate_repository_name(&"x".repeat(101)).is_err());
        assert!(validate_repository_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_owner_names() {
        assert!(validate_owner("acme-corp").is_ok());
        assert!(validate_owner("-acme").is_err());
        assert!(validate_owner("acme_corp").is_err());
        assert!(validate_owner("").is_err());
    }

    #[test]
    fn test_ref_names() {
        assert!(validate_ref_name("branch", "main").is_ok());
        assert!(validate_ref_name("branch", "release/1.0").is_ok());
        assert!(validate_ref_name("branch", "--force").is_err());
        assert!(validate_ref_name("branch", "a..b").is_err());
        assert!(validate_ref_name("remote", "up stream").is_err());
        assert!(validate_ref_name("remote", "").is_err());
    }

    #[test]
    fn test_valid_git_urls() {
        assert!(is_valid_git_url("git@github.com:user/repo.git"));
        assert!(is_valid_git_url("https://github.com/user/repo.git"));
        assert!(is_valid_git_url("http://github.com/user/repo.git"));
        assert!(is_valid_git_url("ssh://git@github.com/user/repo.git"));
        assert!(is_valid_git_url("file:///tmp/remote.git"));
        assert!(is_valid_git_url("/path/to/repo"));
    }

    #[test]
    fn test_invalid_git_urls() {
        assert!(!is_valid_git_url("invalid-url"));
        assert!(!is_valid_git_url(""));
        assert!(!is_valid_git_url("https://"));
        assert!(!is_valid_git_url("ftp://host/repo"));
        assert!(!is_valid_git_url("--upload-pack=evil"));
        assert!(!is_valid_git_url("https://host/a b"));
        assert!(!is_valid_git_url("host:path"));
    }

    #[test]
    fn test_valid_config() {
        let config = ProvisionConfig::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_config_collects_all_errors() {
        let mut config = ProvisionConfig::new();
        config.repository.name = Some("bad/name".to_string());
        config.git.branch = "-x".to_string();
        config.api.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["repository.name", "git.branch", "api.timeout_secs"]
        );

        let err = validate_config_result(&config).unwrap_err();
        assert!(err.to_string().contains("Configuration validation failed"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_bad_names_are_usage_errors() {
        let mut config = ProvisionConfig::new();
        config.repository.name = Some("bad/name".to_string());
        let err = validate_config_result(&config).unwrap_err();
        assert!(matches!(err, ProvisionError::Usage(_)));
        assert_eq!(err.exit_code(), 2);

        let mut config = ProvisionConfig::new();
        config.repository.organization = Some("bad org".to_string());
        let err = validate_config_result(&config).unwrap_err();
        assert!(matches!(err, ProvisionError::Usage(_)));
        assert!(err.to_string().contains("repository.organization"));
    }
}
