//! Local publishing
//!
//! Turns a working directory into a repository whose primary branch tracks
//! the newly created remote. The sequence is strictly ordered:
//!
//! 1. **Initialize** the repository if the directory is not one yet
//! 2. **Configure** the commit identity, when one is set
//! 3. **Stage** everything in the working tree
//! 4. **Commit**, only if something is staged
//! 5. **Attach** the remote (add, or repoint if the URL differs)
//! 6. **Rename** the current branch to the primary branch
//! 7. **Push** with upstream tracking
//!
//! Running it twice on a clean tree creates no second commit but pushes
//! both times.

pub mod git;

use crate::types::PublishResult;
use crate::Result;
use std::path::Path;

pub use git::{is_push_rejection, GitPublisher, PublishOptions};

/// Something that can publish a working directory to a remote URL
pub trait LocalPublisher {
    fn publish_local(&self, working_directory: &Path, remote_url: &str) -> Result<PublishResult>;
}
