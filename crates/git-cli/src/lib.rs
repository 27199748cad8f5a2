//! git command-line wrapper for Rust
//!
//! A typed interface to the `git` binary. Every invocation passes its
//! arguments as an array, so values such as commit messages or remote URLs
//! are never interpreted by a shell.
//!
//! # Example
//!
//! ```no_run
//! use git_cli::Git;
//!
//! let git = Git::with_workdir("/tmp/project");
//!
//! git.init()?;
//! git.add_all()?;
//! if git.has_staged_changes()? {
//!     git.commit("initial commit")?;
//! }
//! git.add_remote("origin", "https://github.com/user/project.git")?;
//! git.push_upstream("origin", "main")?;
//! # Ok::<(), git_cli::Error>(())
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors that can occur when running git
#[derive(Error, Debug)]
pub enum Error {
    #[error("git is not installed or not in PATH")]
    NotInstalled,

    #[error("`{command}` exited with {}: {output}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Result type for git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Output from a git command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The command line, for diagnostics (`git remote add origin ...`)
    pub command: String,
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Get combined stdout and stderr output
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        if stderr.is_empty() {
            stdout.to_string()
        } else if stdout.is_empty() {
            stderr.to_string()
        } else {
            format!("{}\n{}", stdout, stderr)
        }
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`]
    pub fn check(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                output: self.combined(),
                command: self.command,
                code: self.code,
            })
        }
    }
}

/// git CLI wrapper
#[derive(Debug, Clone, Default)]
pub struct Git {
    /// Working directory
    workdir: Option<PathBuf>,
    /// Global flags placed before the subcommand (e.g. `-c key=value`)
    global_flags: Vec<String>,
}

impl Git {
    /// Create with a specific working directory
    pub fn with_workdir(path: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(path.into()),
            global_flags: Vec::new(),
        }
    }

    /// Working directory commands run in, if any
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Add a global flag
    pub fn add_global_flag(&mut self, flag: impl Into<String>) {
        self.global_flags.push(flag.into());
    }

    /// Check if git is available
    pub fn is_available(&self) -> bool {
        self.run(&["--version"]).map(|o| o.success).unwrap_or(false)
    }

    // --- Repository setup ---

    /// Initialize a repository in the working directory
    pub fn init(&self) -> Result<CommandOutput> {
        self.run(&["init"])?.check()
    }

    /// Set a repository-local configuration value
    pub fn set_config(&self, key: &str, value: &str) -> Result<CommandOutput> {
        self.run(&["config", key, value])?.check()
    }

    // --- Index and commits ---

    /// Stage every change in the working tree, including deletions
    pub fn add_all(&self) -> Result<CommandOutput> {
        self.run(&["add", "--all"])?.check()
    }

    /// Whether the index differs from HEAD
    ///
    /// `git diff --cached --quiet` exits 1 when there are differences and 0
    /// when there are none; anything else is a failure.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let output = self.run(&["diff", "--cached", "--quiet"])?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => output.check().map(|_| false),
        }
    }

    /// Create a commit from the index
    pub fn commit(&self, message: &str) -> Result<CommandOutput> {
        self.run(&["commit", "--message", message])?.check()
    }

    /// Object id of HEAD
    pub fn head_commit(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "HEAD"])?.check()?;
        Ok(output.stdout.trim().to_string())
    }

    // --- Remotes ---

    /// URL of a named remote, `None` if the remote is not configured
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let output = self.run(&["remote", "get-url", name])?;
        if output.success {
            Ok(Some(output.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Add a named remote
    pub fn add_remote(&self, name: &str, url: &str) -> Result<CommandOutput> {
        self.run(&["remote", "add", name, url])?.check()
    }

    /// Point an existing remote at a new URL
    pub fn set_remote_url(&self, name: &str, url: &str) -> Result<CommandOutput> {
        self.run(&["remote", "set-url", name, url])?.check()
    }

    // --- Branches ---

    /// Rename the current branch; git refuses if `name` already exists
    pub fn rename_branch(&self, name: &str) -> Result<CommandOutput> {
        self.run(&["branch", "-m", name])?.check()
    }

    /// Point HEAD at a branch without requiring it to exist (unborn branch)
    pub fn set_head_branch(&self, name: &str) -> Result<CommandOutput> {
        let refname = format!("refs/heads/{}", name);
        self.run(&["symbolic-ref", "HEAD", &refname])?.check()
    }

    /// Push a branch and record it as the upstream of the local branch
    ///
    /// The raw output is returned on failure too, so callers can inspect
    /// the remote's diagnostic text.
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        self.run(&["push", "--set-upstream", remote, branch])
    }

    // --- Raw command execution ---

    /// Run an arbitrary git command and capture its output
    ///
    /// A non-zero exit is not an error here; use [`CommandOutput::check`].
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new("git");

        for flag in &self.global_flags {
            cmd.arg(flag);
        }

        cmd.args(args);

        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }

        let command = describe(args);
        tracing::debug!(command = %command, workdir = ?self.workdir, "Running git");

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound if self.workdir.as_deref().map_or(true, Path::is_dir) => {
                Error::NotInstalled
            }
            _ => Error::Io(e),
        })?;

        let result = CommandOutput {
            command,
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success {
            tracing::debug!(
                command = %result.command,
                code = ?result.code,
                stderr = %result.stderr.trim_end(),
                "git exited unsuccessfully"
            );
        }

        Ok(result)
    }
}

fn describe(args: &[&str]) -> String {
    let mut line = String::from("git");
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push_str(&format!("{:?}", arg));
        } else {
            line.push_str(arg);
        }
    }
    line
}
