//! Provisioning: create the remote, then publish to it
//!
//! A two-step saga without compensation. If the remote is created but the
//! publish fails, the remote stays; the failure says which stage broke and
//! carries the commands to finish by hand.

use crate::forge::RemoteHost;
use crate::publish::LocalPublisher;
use crate::types::{
    Credential, ProvisionReport, ProvisioningResult, PublishStep, RepositoryDescriptor,
};
use crate::ProvisionError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Which half of the saga failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateRemote,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CreateRemote => write!(f, "remote creation"),
            Stage::Publish => write!(f, "local publish"),
        }
    }
}

/// A failed provisioning run
#[derive(Debug)]
pub struct ProvisionFailure {
    pub stage: Stage,
    pub error: ProvisionError,
    /// The remote, if it was created before the failure
    pub created: Option<ProvisioningResult>,
    /// Commands that finish the interrupted work by hand
    pub manual_steps: Vec<String>,
}

impl fmt::Display for ProvisionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for ProvisionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl ProvisionFailure {
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// Progress notifications, emitted before and after each stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    CreatingRemote { name: String },
    RemoteCreated { url: String },
    Publishing { path: PathBuf, url: String },
    Published { branch: String },
}

type ProgressFn = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Names used when writing manual fallback commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackHints {
    /// Web page where a repository can be created by hand
    pub new_repository_page: String,
    pub remote: String,
    pub branch: String,
}

impl Default for FallbackHints {
    fn default() -> Self {
        Self {
            new_repository_page: "https://github.com/new".to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
        }
    }
}

/// Orchestrates [`RemoteHost::create_remote`] and
/// [`LocalPublisher::publish_local`]
pub struct Provisioner<H, P> {
    host: H,
    publisher: P,
    hints: FallbackHints,
    progress: Option<ProgressFn>,
}

impl<H: RemoteHost, P: LocalPublisher> Provisioner<H, P> {
    pub fn new(host: H, publisher: P) -> Self {
        Self {
            host,
            publisher,
            hints: FallbackHints::default(),
            progress: None,
        }
    }

    pub fn with_hints(mut self, hints: FallbackHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref progress) = self.progress {
            progress(&event);
        }
    }

    /// Create the remote, then publish `working_directory` to it
    ///
    /// Publishing is never attempted when creation fails.
    pub async fn provision(
        &self,
        credential: &Credential,
        descriptor: &RepositoryDescriptor,
        working_directory: &Path,
    ) -> std::result::Result<ProvisionReport, ProvisionFailure> {
        if let Err(e) = descriptor.validate() {
            return Err(self.fail(Stage::CreateRemote, e, None, working_directory));
        }

        self.emit(ProgressEvent::CreatingRemote {
            name: descriptor.name.clone(),
        });

        let remote = match self.host.create_remote(credential, descriptor).await {
            Ok(remote) => remote,
            Err(e) => return Err(self.fail(Stage::CreateRemote, e, None, working_directory)),
        };

        info!(url = %remote.remote_url, "Remote ready");
        self.emit(ProgressEvent::RemoteCreated {
            url: remote.remote_url.clone(),
        });
        self.emit(ProgressEvent::Publishing {
            path: working_directory.to_path_buf(),
            url: remote.remote_url.clone(),
        });

        match self
            .publisher
            .publish_local(working_directory, &remote.remote_url)
        {
            Ok(publish) => {
                self.emit(ProgressEvent::Published {
                    branch: publish.branch.clone(),
                });
                Ok(ProvisionReport { remote, publish })
            }
            Err(e) => Err(self.fail(Stage::Publish, e, Some(remote), working_directory)),
        }
    }

    fn fail(
        &self,
        stage: Stage,
        error: ProvisionError,
        created: Option<ProvisioningResult>,
        working_directory: &Path,
    ) -> ProvisionFailure {
        error!(stage = %stage, error = %error, "Provisioning failed");
        let manual_steps = manual_steps(
            &self.hints,
            stage,
            &error,
            created.as_ref().map(|c| c.remote_url.as_str()),
            working_directory,
        );
        ProvisionFailure {
            stage,
            error,
            created,
            manual_steps,
        }
    }
}

/// Commands that complete the interrupted work by hand
pub fn manual_steps(
    hints: &FallbackHints,
    stage: Stage,
    error: &ProvisionError,
    remote_url: Option<&str>,
    working_directory: &Path,
) -> Vec<String> {
    if matches!(error, ProvisionError::Usage(_) | ProvisionError::Config(_)) {
        return Vec::new();
    }

    let cd = format!("cd {}", working_directory.display());
    let push = format!("git push -u {} {}", hints.remote, hints.branch);

    match stage {
        Stage::CreateRemote => vec![
            format!("Create the repository manually at {}", hints.new_repository_page),
            format!(
                "git remote add {} <repository URL>   (inside {})",
                hints.remote,
                working_directory.display()
            ),
            format!("Then run: {} && {}", cd, push),
        ],
        Stage::Publish => {
            let url = remote_url.unwrap_or("<repository URL>");
            let mut steps = vec![cd];
            let failed_before_remote = matches!(
                error,
                ProvisionError::LocalVcsFailure { step, .. } if *step <= PublishStep::AttachRemote
            );
            if failed_before_remote {
                steps.push("git add --all".to_string());
                steps.push("git commit -m \"Initial commit\"".to_string());
                steps.push(format!("git remote add {} {}", hints.remote, url));
                steps.push(format!("git branch -m {}", hints.branch));
            }
            let diverged = error
                .diagnostics()
                .is_some_and(|d| d.contains("fetch first") || d.contains("non-fast-forward"));
            if diverged {
                steps.push(format!("git pull --rebase {} {}", hints.remote, hints.branch));
            }
            steps.push(push);
            steps
        }
    }
}
