//! Publishing a working directory with the git CLI
//!
//! Mutations go through the `git` binary so pushes use the user's own
//! credential helpers and SSH setup. Read-only inspection (is this
//! directory a repository root, what is HEAD) uses libgit2.

use super::LocalPublisher;
use crate::config::{validation, ProvisionConfig};
use crate::types::{ProvisionMode, PublishResult, PublishStep, StepOutcome};
use crate::{ProvisionError, Result};
use git2::{BranchType, ErrorCode, Repository};
use git_cli::{CommandOutput, Git};
use std::path::Path;
use tracing::{debug, info};

/// Push output fragments that mean the remote refused the push, as opposed
/// to git failing locally
const PUSH_REJECTION_MARKERS: &[&str] = &[
    "[rejected]",
    "[remote rejected]",
    "non-fast-forward",
    "fetch first",
    "Updates were rejected",
    "Authentication failed",
    "Permission denied",
    "returned error: 403",
    "could not read Username",
    "protected branch",
];

/// Settings for one publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    pub mode: ProvisionMode,
    pub remote: String,
    pub branch: String,
    pub commit_message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self::from_config(&ProvisionConfig::default(), ProvisionMode::FullSetup)
    }
}

impl PublishOptions {
    pub fn from_config(config: &ProvisionConfig, mode: ProvisionMode) -> Self {
        Self {
            mode,
            remote: config.git.remote.clone(),
            branch: config.git.branch.clone(),
            commit_message: config.git.commit_message.clone(),
            author_name: config.git.author_name.clone(),
            author_email: config.git.author_email.clone(),
        }
    }
}

/// [`LocalPublisher`] backed by the git CLI
///
/// Not safe to run concurrently against the same working directory: git's
/// index and config files are not locked across the whole sequence.
#[derive(Debug, Clone, Default)]
pub struct GitPublisher {
    options: PublishOptions,
}

impl GitPublisher {
    pub fn new(options: PublishOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    fn git(&self, working_directory: &Path) -> Git {
        let mut git = Git::with_workdir(working_directory);
        git.add_global_flag("-c");
        git.add_global_flag(format!("init.defaultBranch={}", self.options.branch));
        git
    }

    fn check_inputs(&self, working_directory: &Path, remote_url: &str) -> Result<()> {
        if !working_directory.is_dir() {
            return Err(ProvisionError::Usage(format!(
                "working directory {} does not exist or is not a directory",
                working_directory.display()
            )));
        }
        std::fs::read_dir(working_directory)?;

        validation::validate_remote_url(remote_url)?;
        validation::validate_ref_name("remote", &self.options.remote)?;
        validation::validate_ref_name("branch", &self.options.branch)?;
        Ok(())
    }

    /// Steps 1-4: initialize, configure identity, stage, commit
    fn prepare(
        &self,
        git: &Git,
        working_directory: &Path,
        steps: &mut Vec<StepOutcome>,
    ) -> Result<()> {
        if is_repository_root(working_directory)? {
            debug!(path = %working_directory.display(), "Reusing existing repository");
            steps.push(StepOutcome::skipped(
                PublishStep::Initialize,
                "already a repository",
            ));
        } else {
            info!(path = %working_directory.display(), "Initializing repository");
            git.init().map_err(vcs_failure(PublishStep::Initialize))?;
            steps.push(StepOutcome::completed(PublishStep::Initialize));
        }

        let identity = [
            ("user.name", self.options.author_name.as_deref()),
            ("user.email", self.options.author_email.as_deref()),
        ];
        let mut configured = false;
        for (key, value) in identity {
            if let Some(value) = value {
                git.set_config(key, value)
                    .map_err(vcs_failure(PublishStep::Configure))?;
                configured = true;
            }
        }
        steps.push(if configured {
            StepOutcome::completed(PublishStep::Configure)
        } else {
            StepOutcome::skipped(PublishStep::Configure, "no identity configured")
        });

        git.add_all().map_err(vcs_failure(PublishStep::Stage))?;
        steps.push(StepOutcome::completed(PublishStep::Stage));

        let staged = git
            .has_staged_changes()
            .map_err(vcs_failure(PublishStep::Commit))?;
        if staged {
            info!(message = %self.options.commit_message, "Creating commit");
            git.commit(&self.options.commit_message)
                .map_err(vcs_failure(PublishStep::Commit))?;
            steps.push(StepOutcome::completed(PublishStep::Commit));
        } else {
            debug!("Nothing staged, skipping commit");
            steps.push(StepOutcome::skipped(PublishStep::Commit, "nothing to commit"));
        }

        Ok(())
    }

    /// Step 5: add the remote, or repoint it if it differs
    fn attach_remote(&self, git: &Git, remote_url: &str) -> Result<StepOutcome> {
        let remote = &self.options.remote;
        let current = git
            .remote_url(remote)
            .map_err(vcs_failure(PublishStep::AttachRemote))?;

        match current {
            Some(ref url) if url == remote_url => {
                debug!(remote = %remote, url = %url, "Remote already attached");
                Ok(StepOutcome::skipped(
                    PublishStep::AttachRemote,
                    "remote already points at this URL",
                ))
            }
            Some(ref url) => {
                info!(remote = %remote, from = %url, to = %remote_url, "Updating remote URL");
                git.set_remote_url(remote, remote_url)
                    .map_err(vcs_failure(PublishStep::AttachRemote))?;
                Ok(StepOutcome::completed(PublishStep::AttachRemote))
            }
            None => {
                info!(remote = %remote, url = %remote_url, "Adding remote");
                git.add_remote(remote, remote_url)
                    .map_err(vcs_failure(PublishStep::AttachRemote))?;
                Ok(StepOutcome::completed(PublishStep::AttachRemote))
            }
        }
    }

    /// Step 6: make the primary branch current
    ///
    /// Never overwrites a different local branch that already has the
    /// primary branch's name.
    fn rename_branch(&self, git: &Git, working_directory: &Path) -> Result<StepOutcome> {
        let branch = &self.options.branch;
        let current = current_branch(working_directory)?;
        if current.as_deref() == Some(branch.as_str()) {
            debug!(branch = %branch, "Already on primary branch");
            return Ok(StepOutcome::skipped(
                PublishStep::RenameBranch,
                format!("already on {}", branch),
            ));
        }

        if local_branch_exists(working_directory, branch)? {
            return Err(ProvisionError::LocalVcsFailure {
                step: PublishStep::RenameBranch,
                output: format!(
                    "a local branch named '{}' already exists and HEAD is on {}; \
                     check it out or choose another --branch",
                    branch,
                    current.as_deref().unwrap_or("a detached commit")
                ),
            });
        }

        if head_commit(working_directory)?.is_some() {
            info!(from = ?current, to = %branch, "Renaming branch");
            git.rename_branch(branch)
                .map_err(vcs_failure(PublishStep::RenameBranch))?;
        } else {
            git.set_head_branch(branch)
                .map_err(vcs_failure(PublishStep::RenameBranch))?;
        }
        Ok(StepOutcome::completed(PublishStep::RenameBranch))
    }

    /// Step 7: push with upstream tracking
    fn push(&self, git: &Git) -> Result<StepOutcome> {
        let remote = &self.options.remote;
        let branch = &self.options.branch;

        info!(remote = %remote, branch = %branch, "Pushing to remote");
        let output = git
            .push_upstream(remote, branch)
            .map_err(vcs_failure(PublishStep::Push))?;

        if !output.success {
            return Err(classify_push_failure(&output));
        }

        info!(remote = %remote, branch = %branch, "Push completed");
        Ok(StepOutcome::completed(PublishStep::Push))
    }
}

impl LocalPublisher for GitPublisher {
    fn publish_local(&self, working_directory: &Path, remote_url: &str) -> Result<PublishResult> {
        self.check_inputs(working_directory, remote_url)?;

        let git = self.git(working_directory);
        let mut steps = Vec::with_capacity(PublishStep::ALL.len());

        match self.options.mode {
            ProvisionMode::FullSetup => self.prepare(&git, working_directory, &mut steps)?,
            ProvisionMode::PushOnly => {
                if !is_repository_root(working_directory)? {
                    return Err(ProvisionError::LocalVcsFailure {
                        step: PublishStep::Initialize,
                        output: format!(
                            "{} is not a git repository; push-only mode needs an initialized repository",
                            working_directory.display()
                        ),
                    });
                }
                for step in [
                    PublishStep::Initialize,
                    PublishStep::Configure,
                    PublishStep::Stage,
                    PublishStep::Commit,
                ] {
                    steps.push(StepOutcome::skipped(step, "push-only mode"));
                }
            }
        }

        steps.push(self.attach_remote(&git, remote_url)?);
        steps.push(self.rename_branch(&git, working_directory)?);
        steps.push(self.push(&git)?);

        Ok(PublishResult {
            remote_url: remote_url.to_string(),
            branch: self.options.branch.clone(),
            commit: head_commit(working_directory)?,
            steps,
        })
    }
}

/// Whether `path` is the top level of a non-bare repository
///
/// A directory nested inside some other repository does not count.
pub fn is_repository_root(path: &Path) -> Result<bool> {
    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let Some(workdir) = repo.workdir() else {
        return Ok(false);
    };
    Ok(workdir.canonicalize()? == path.canonicalize()?)
}

/// HEAD commit id, `None` for a missing repository or an unborn branch
pub fn head_commit(path: &Path) -> Result<Option<String>> {
    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            return Ok(None)
        }
        Err(e) => return Err(e.into()),
    };

    let id = head.peel_to_commit()?.id().to_string();
    Ok(Some(id))
}

/// Branch HEAD points at, born or unborn; `None` when HEAD is detached
pub fn current_branch(path: &Path) -> Result<Option<String>> {
    let repo = Repository::open(path)?;
    let head = repo.find_reference("HEAD")?;
    let name = head
        .symbolic_target()
        .and_then(|target| target.strip_prefix("refs/heads/"))
        .map(str::to_string);
    Ok(name)
}

/// Whether a local branch called `name` exists
pub fn local_branch_exists(path: &Path, name: &str) -> Result<bool> {
    let repo = Repository::open(path)?;
    let exists = match repo.find_branch(name, BranchType::Local) {
        Ok(_) => true,
        Err(e) if e.code() == ErrorCode::NotFound => false,
        Err(e) => return Err(e.into()),
    };
    Ok(exists)
}

/// Whether push output says the remote refused the push
pub fn is_push_rejection(output: &str) -> bool {
    PUSH_REJECTION_MARKERS
        .iter()
        .any(|marker| output.contains(marker))
}

fn classify_push_failure(output: &CommandOutput) -> ProvisionError {
    let text = output.combined();
    if is_push_rejection(&text) {
        ProvisionError::PushRejected { output: text }
    } else {
        ProvisionError::LocalVcsFailure {
            step: PublishStep::Push,
            output: format!("{}\n{}", output.command, text),
        }
    }
}

fn vcs_failure(step: PublishStep) -> impl Fn(git_cli::Error) -> ProvisionError {
    move |e| {
        let output = match e {
            git_cli::Error::CommandFailed {
                command, output, ..
            } => format!("{}\n{}", command, output),
            other => other.to_string(),
        };
        ProvisionError::LocalVcsFailure { step, output }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn failed_push(stderr: &str) -> CommandOutput {
        CommandOutput {
            command: "git push --set-upstream origin main".to_string(),
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_rejection_is_push_rejected() {
        let output = failed_push(
            " ! [rejected]        main -> main (fetch first)\nerror: failed to push some refs",
        );
        assert!(matches!(
            classify_push_failure(&output),
            ProvisionError::PushRejected { .. }
        ));

        let output = failed_push("remote: Permission to user/demo.git denied.\nfatal: unable to access 'https://github.com/user/demo/': The requested URL returned error: 403");
        assert!(matches!(
            classify_push_failure(&output),
            ProvisionError::PushRejected { .. }
        ));
    }

    #[test]
    fn test_other_push_failure_is_local() {
        let output = failed_push("error: src refspec main does not match any");
        match classify_push_failure(&output) {
            ProvisionError::LocalVcsFailure { step, output } => {
                assert_eq!(step, PublishStep::Push);
                assert!(output.starts_with("git push --set-upstream origin main"));
                assert!(output.contains("src refspec"));
            }
            other => panic!("expected LocalVcsFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_vcs_failure_keeps_step_and_command() {
        let err = vcs_failure(PublishStep::Stage)(git_cli::Error::CommandFailed {
            command: "git add --all".to_string(),
            code: Some(128),
            output: "fatal: not a git repository".to_string(),
        });
        match err {
            ProvisionError::LocalVcsFailure { step, output } => {
                assert_eq!(step, PublishStep::Stage);
                assert_eq!(output, "git add --all\nfatal: not a git repository");
            }
            other => panic!("expected LocalVcsFailure, got {:?}", other),
        }

        let err = vcs_failure(PublishStep::Initialize)(git_cli::Error::NotInstalled);
        assert!(err.to_string().contains("not installed"));
    }

    #[test]
    fn test_plain_directory_is_not_a_repository_root() {
        let dir = TempDir::new().unwrap();
        assert!(!is_repository_root(dir.path()).unwrap());
        assert_eq!(head_commit(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_nested_directory_is_not_a_repository_root() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();

        assert!(is_repository_root(dir.path()).unwrap());
        assert!(!is_repository_root(&nested).unwrap());
        assert_eq!(head_commit(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_current_branch_on_unborn_repository() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/trunk").unwrap();

        assert_eq!(current_branch(dir.path()).unwrap().as_deref(), Some("trunk"));
        assert!(!local_branch_exists(dir.path(), "trunk").unwrap());
        assert!(!local_branch_exists(dir.path(), "main").unwrap());
    }

    #[test]
    fn test_missing_directory_is_usage_error() {
        let publisher = GitPublisher::default();
        let result = publisher.publish_local(
            Path::new("/nonexistent/repo-provision/dir"),
            "https://github.com/user/demo",
        );
        assert!(matches!(result, Err(ProvisionError::Usage(_))));
    }

    #[test]
    fn test_invalid_remote_url_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let publisher = GitPublisher::default();
        let result = publisher.publish_local(dir.path(), "--upload-pack=touch /tmp/x");
        assert!(matches!(result, Err(ProvisionError::Usage(_))));
        assert!(!dir.path().join(".git").exists());
    }

    #[test]
    fn test_push_only_requires_repository() {
        let dir = TempDir::new().unwrap();
        let publisher = GitPublisher::new(PublishOptions {
            mode: ProvisionMode::PushOnly,
            ..PublishOptions::default()
        });

        match publisher.publish_local(dir.path(), "https://github.com/user/demo") {
            Err(ProvisionError::LocalVcsFailure { step, .. }) => {
                assert_eq!(step, PublishStep::Initialize)
            }
            other => panic!("expected LocalVcsFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_options_from_config() {
        let mut config = ProvisionConfig::new();
        config.git.branch = "trunk".to_string();
        config.git.author_email = Some("dev@example.com".to_string());

        let options = PublishOptions::from_config(&config, ProvisionMode::PushOnly);
        assert_eq!(options.branch, "trunk");
        assert_eq!(options.remote, "origin");
        assert_eq!(options.mode, ProvisionMode::PushOnly);
        assert_eq!(options.author_email.as_deref(), Some("dev@example.com"));
        assert!(options.author_name.is_none());
    }
}
