//! Test-only helpers: a fake version-control collaborator and a minimal
//! Rails project fixture.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::io::vcs::VersionControl;

/// A call observed by [`RecordingVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Init,
    Add(String),
    Commit(String),
}

/// Version-control stub that records every call and can reject commits.
#[derive(Debug, Default)]
pub struct RecordingVcs {
    calls: RefCell<Vec<VcsCall>>,
    commit_error: Option<String>,
}

impl RecordingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `commit` fails with `reason` (after being recorded).
    pub fn rejecting_commits(reason: &str) -> Self {
        Self {
            calls: RefCell::default(),
            commit_error: Some(reason.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.borrow().clone()
    }

    /// Commit messages, in call order.
    pub fn commits(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                VcsCall::Commit(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl VersionControl for RecordingVcs {
    fn init(&self) -> Result<()> {
        self.calls.borrow_mut().push(VcsCall::Init);
        Ok(())
    }

    fn add(&self, pathspec: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(VcsCall::Add(pathspec.to_string()));
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(VcsCall::Commit(message.to_string()));
        match &self.commit_error {
            Some(reason) => Err(anyhow!("{reason}")),
            None => Ok(()),
        }
    }
}

pub const GEMFILE: &str = "source \"https://rubygems.org\"\ngit_source(:github) { |repo| \"https://github.com/#{repo}.git\" }\n\nruby \"3.2.2\"\n\ngem \"rails\", \"~> 7.0.4\"\ngem \"pg\", \"~> 1.1\"\ngem \"puma\", \"~> 5.0\"\n";

pub const DATABASE_YML: &str = "default: &default\n  adapter: postgresql\n  encoding: unicode\n  pool: <%= ENV.fetch(\"RAILS_MAX_THREADS\") { 5 } %>\n\ndevelopment:\n  <<: *default\n  database: blog_development\n\ntest:\n  <<: *default\n  database: blog_test\n\nproduction:\n  <<: *default\n  database: blog_production\n";

pub const GITIGNORE: &str = "/.bundle\n/log/*\n/tmp/*\n/config/master.key\n";

/// A temp directory holding the files a freshly generated Rails app has
/// and the plan edits in place.
pub struct RailsSkeleton {
    dir: TempDir,
}

impl RailsSkeleton {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let skeleton = Self { dir };
        skeleton.write("Gemfile", GEMFILE)?;
        skeleton.write("config/database.yml", DATABASE_YML)?;
        skeleton.write(".gitignore", GITIGNORE)?;
        Ok(skeleton)
    }

    /// An empty project root (no Rails files at all).
    pub fn empty() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        Ok(fs::read_to_string(self.join(rel))?)
    }

    pub fn remove(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.join(rel))?;
        Ok(())
    }
}
