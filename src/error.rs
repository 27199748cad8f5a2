//! Error types for repo-provision
//!
//! One enum covers every failure mode of a provisioning run. The first five
//! variants are the ones a user sees from the workflow itself; the rest are
//! ambient failures (configuration, filesystem, libgit2).

use crate::types::PublishStep;
use thiserror::Error;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Error type for provisioning operations
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A required input is missing or malformed
    #[error("Usage error: {0}")]
    Usage(String),

    /// The provider could not be reached or answered unintelligibly
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status
    #[error("Remote rejected the request (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: String },

    /// A local git step exited non-zero
    #[error("git {step} step failed: {output}")]
    LocalVcsFailure { step: PublishStep, output: String },

    /// The remote refused the push
    #[error("Push rejected by remote: {output}")]
    PushRejected { output: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Git2 library errors
    #[error("Git library error: {0}")]
    Git2(#[from] git2::Error),
}

impl ProvisionError {
    /// Process exit status the CLI uses for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::Usage(_) => 2,
            _ => 1,
        }
    }

    /// Captured diagnostic text from the provider or git, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ProvisionError::RemoteRejected { body, .. } => Some(body),
            ProvisionError::LocalVcsFailure { output, .. } => Some(output),
            ProvisionError::PushRejected { output } => Some(output),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "request timed out"
        } else if e.is_connect() {
            "connection failed"
        } else if e.is_decode() {
            "malformed response body"
        } else {
            "request failed"
        };
        ProvisionError::Network(format!("{}: {}", kind, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProvisionError::Usage("missing token".into()).exit_code(), 2);
        assert_eq!(ProvisionError::Network("dns".into()).exit_code(), 1);
        assert_eq!(
            ProvisionError::RemoteRejected {
                status: 422,
                body: "{}".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_diagnostics_surface_raw_text() {
        let err = ProvisionError::RemoteRejected {
            status: 422,
            body: r#"{"message":"Repository creation failed."}"#.into(),
        };
        assert_eq!(
            err.diagnostics(),
            Some(r#"{"message":"Repository creation failed."}"#)
        );

        let err = ProvisionError::LocalVcsFailure {
            step: PublishStep::Commit,
            output: "nothing to commit".into(),
        };
        assert_eq!(err.diagnostics(), Some("nothing to commit"));
        assert_eq!(
            err.to_string(),
            "git commit step failed: nothing to commit"
        );

        assert_eq!(ProvisionError::Config("bad".into()).diagnostics(), None);
    }
}
