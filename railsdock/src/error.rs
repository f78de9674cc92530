//! Failure taxonomy for plan steps.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Coarse classification of a step failure, as reported to the invoking host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A filesystem operation failed, a target escaped the project root, or
    /// a replacement pattern does not compile.
    Io,
    /// An append/replace target (or shell working directory) does not exist.
    MissingFile,
    /// A strict replacement found zero matches.
    PatternNotFound,
    /// A shell command could not run or exited unsuccessfully.
    Command,
    /// The version-control collaborator rejected a checkpoint.
    Checkpoint,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Io => "IOFailure",
            FailureKind::MissingFile => "MissingFileFailure",
            FailureKind::PatternNotFound => "PatternNotFoundFailure",
            FailureKind::Command => "CommandFailure",
            FailureKind::Checkpoint => "CheckpointFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while applying a single step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("io failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("target path '{path}' escapes the project root")]
    PathEscapesRoot { path: String },

    #[error("missing file {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("pattern /{pattern}/ not found in {}", .path.display())]
    PatternNotFound { path: PathBuf, pattern: String },

    #[error("invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` failed ({})", exit_label(.exit_code))]
    Command {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("command `{command}` timed out after {timeout_secs}s")]
    CommandTimedOut { command: String, timeout_secs: u64 },

    #[error("checkpoint '{message}' failed: {cause:#}")]
    Checkpoint {
        message: String,
        cause: anyhow::Error,
    },
}

impl StepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StepError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Io { .. }
            | StepError::PathEscapesRoot { .. }
            | StepError::InvalidPattern { .. } => FailureKind::Io,
            StepError::MissingFile { .. } => FailureKind::MissingFile,
            StepError::PatternNotFound { .. } => FailureKind::PatternNotFound,
            StepError::Spawn { .. }
            | StepError::Command { .. }
            | StepError::CommandTimedOut { .. } => FailureKind::Command,
            StepError::Checkpoint { .. } => FailureKind::Checkpoint,
        }
    }

    /// Exit code of a failed command, when the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StepError::Command { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// A step failure annotated with its position in the plan.
///
/// Steps before `index` have been applied; the project root is left as-is.
#[derive(Debug, thiserror::Error)]
#[error("step {} of {total} ({description}) failed: {source}", .index + 1)]
pub struct ApplyError {
    /// Zero-based position of the failing step.
    pub index: usize,
    pub total: usize,
    pub description: String,
    #[source]
    pub source: StepError,
}

impl ApplyError {
    pub fn kind(&self) -> FailureKind {
        self.source.kind()
    }
}
