//! Version-control collaborator used by checkpoint steps.

use anyhow::Result;
use tracing::debug;

/// The three operations a checkpoint needs from version control.
pub trait VersionControl {
    /// Initialize a repository in the project root (harmless if one exists).
    fn init(&self) -> Result<()>;
    /// Stage changes matching `pathspec`.
    fn add(&self, pathspec: &str) -> Result<()>;
    /// Commit staged changes. Errors when there is nothing to commit.
    fn commit(&self, message: &str) -> Result<()>;
}

/// Collaborator for projects applied without version control; every call succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVcs;

impl VersionControl for NoVcs {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn add(&self, pathspec: &str) -> Result<()> {
        debug!(pathspec, "version control disabled, skipping add");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        debug!(message, "version control disabled, skipping commit");
        Ok(())
    }
}
