//! CLI definition
//!
//! One command, one required positional argument (the API token). Every
//! flag overrides the corresponding configuration file value.

use crate::config::ProvisionConfig;
use crate::types::{Credential, ProvisionMode, Visibility};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Create a hosted repository and publish a local directory to it
#[derive(Parser, Debug)]
#[command(name = "provision")]
#[command(version, about, long_about = None)]
#[command(after_help = "Create a token at https://github.com/settings/tokens")]
pub struct Cli {
    /// API token allowed to create repositories
    #[arg(value_name = "TOKEN", value_parser = parse_credential)]
    pub token: Credential,

    /// Repository name (default: the directory's name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Repository description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Create a private repository
    #[arg(long)]
    pub private: bool,

    /// Disable issues
    #[arg(long)]
    pub no_issues: bool,

    /// Disable the wiki
    #[arg(long)]
    pub no_wiki: bool,

    /// Disable projects
    #[arg(long)]
    pub no_projects: bool,

    /// License template keyword (e.g. mit, apache-2.0)
    #[arg(long)]
    pub license: Option<String>,

    /// Create under an organization instead of the token's user
    #[arg(long)]
    pub org: Option<String>,

    /// Directory to publish (default: current directory)
    #[arg(short, long = "dir", value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Remote name to attach (default: origin)
    #[arg(long)]
    pub remote: Option<String>,

    /// Branch pushed upstream (default: main)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Message for the initial commit
    #[arg(short, long)]
    pub message: Option<String>,

    /// Commit author name written to the repository's git config
    #[arg(long)]
    pub author_name: Option<String>,

    /// Commit author email written to the repository's git config
    #[arg(long)]
    pub author_email: Option<String>,

    /// API base URL (GitHub Enterprise host or API root)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Only attach the remote and push; the directory is already a repository
    #[arg(long)]
    pub push_only: bool,

    /// Path to config file (default: ~/.config/repo-provision/config.yaml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose/debug output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_credential(value: &str) -> Result<Credential, String> {
    Credential::new(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Publish mode selected by the flags
    pub fn mode(&self) -> ProvisionMode {
        if self.push_only {
            ProvisionMode::PushOnly
        } else {
            ProvisionMode::FullSetup
        }
    }

    /// Overlay command-line values onto a loaded configuration
    pub fn apply_to(&self, config: &mut ProvisionConfig) {
        let repository = &mut config.repository;
        if let Some(ref name) = self.name {
            repository.name = Some(name.clone());
        }
        if let Some(ref description) = self.description {
            repository.description = description.clone();
        }
        if self.private {
            repository.visibility = Visibility::Private;
        }
        if self.no_issues {
            repository.enable_issues = false;
        }
        if self.no_wiki {
            repository.enable_wiki = false;
        }
        if self.no_projects {
            repository.enable_projects = false;
        }
        if let Some(ref license) = self.license {
            repository.license = license.clone();
        }
        if let Some(ref org) = self.org {
            repository.organization = Some(org.clone());
        }

        let git = &mut config.git;
        if let Some(ref remote) = self.remote {
            git.remote = remote.clone();
        }
        if let Some(ref branch) = self.branch {
            git.branch = branch.clone();
        }
        if let Some(ref message) = self.message {
            git.commit_message = message.clone();
        }
        if let Some(ref author_name) = self.author_name {
            git.author_name = Some(author_name.clone());
        }
        if let Some(ref author_email) = self.author_email {
            git.author_email = Some(author_email.clone());
        }

        if let Some(ref api_url) = self.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.api.timeout_secs = timeout_secs;
        }

        if let Some(ref dir) = self.dir {
            config.working_directory = Some(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_missing_token_is_usage_error() {
        let err = Cli::try_parse_from(["provision"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let err = Cli::try_parse_from(["provision", ""]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_token_only() {
        let cli = Cli::try_parse_from(["provision", "tok123"]).unwrap();
        assert_eq!(cli.token.expose(), "tok123");
        assert_eq!(cli.mode(), ProvisionMode::FullSetup);
        assert!(!format!("{:?}", cli).contains("tok123"));

        let mut config = ProvisionConfig::new();
        cli.apply_to(&mut config);
        assert_eq!(config, ProvisionConfig::new());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "provision",
            "tok123",
            "--name",
            "demo",
            "--private",
            "--no-wiki",
            "--org",
            "acme",
            "--branch",
            "trunk",
            "--author-email",
            "dev@example.com",
            "--api-url",
            "https://github.example.com",
            "--timeout-secs",
            "5",
            "--dir",
            "/work/demo",
            "--push-only",
        ])
        .unwrap();

        let mut config = ProvisionConfig::new();
        config.repository.description = "from file".to_string();
        cli.apply_to(&mut config);

        assert_eq!(config.repository.name.as_deref(), Some("demo"));
        assert_eq!(config.repository.description, "from file");
        assert_eq!(config.repository.visibility, Visibility::Private);
        assert!(!config.repository.enable_wiki);
        assert!(config.repository.enable_issues);
        assert_eq!(config.repository.organization.as_deref(), Some("acme"));
        assert_eq!(config.git.branch, "trunk");
        assert_eq!(config.git.author_email.as_deref(), Some("dev@example.com"));
        assert_eq!(config.api.base_url, "https://github.example.com");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.working_directory, Some(PathBuf::from("/work/demo")));
        assert_eq!(cli.mode(), ProvisionMode::PushOnly);
    }

    #[test]
    fn test_verbosity_count() {
        let cli = Cli::try_parse_from(["provision", "tok", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
