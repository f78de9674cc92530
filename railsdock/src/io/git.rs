//! Git adapter for checkpoint steps.
//!
//! Checkpoints snapshot the project with plain `git` subprocess calls, so we
//! keep a small, explicit wrapper around them.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use super::vcs::VersionControl;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Return the current HEAD short SHA.
    pub fn head_short_sha(&self, len: usize) -> Result<String> {
        let arg = format!("--short={len}");
        let out = self.run_capture(&["rev-parse", &arg, "HEAD"])?;
        Ok(out.trim().to_string())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_checked(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

impl VersionControl for Git {
    #[instrument(skip_all)]
    fn init(&self) -> Result<()> {
        debug!(workdir = %self.workdir.display(), "initializing repository");
        self.run_checked(&["init"])?;
        Ok(())
    }

    #[instrument(skip_all, fields(pathspec = pathspec))]
    fn add(&self, pathspec: &str) -> Result<()> {
        self.run_checked(&["add", "--", pathspec])?;
        Ok(())
    }

    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<()> {
        if !self.has_staged_changes()? {
            return Err(anyhow!("nothing to commit"));
        }
        self.run_checked(&["commit", "-m", message])?;
        let sha = self.head_short_sha(8)?;
        info!(sha = %sha, message, "checkpoint committed");
        Ok(())
    }
}
