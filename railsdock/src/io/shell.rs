//! Shell command steps.
//!
//! Commands run through `sh -c` with inherited stdout/stderr so the operator
//! sees their output directly; nothing is captured.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::StepError;
use crate::io::fs_ops::confined_path;

/// Run `command` in `root` (or `root/<working_subdirectory>`), bounded by `timeout`.
#[instrument(skip(root), fields(timeout_secs = timeout.as_secs()))]
pub fn run_shell(
    root: &Path,
    command: &str,
    working_subdirectory: Option<&str>,
    timeout: Duration,
) -> Result<(), StepError> {
    let workdir = confined_path(root, working_subdirectory.unwrap_or(""))?;
    if !workdir.is_dir() {
        return Err(StepError::MissingFile { path: workdir });
    }

    debug!(workdir = %workdir.display(), "spawning shell command");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(&workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| {
            error!(err = %source, "failed to spawn command");
            StepError::Spawn {
                command: command.to_string(),
                source,
            }
        })?;

    let spawn_err = |source| StepError::Spawn {
        command: command.to_string(),
        source,
    };
    let status = match child.wait_timeout(timeout).map_err(spawn_err)? {
        Some(status) => status,
        None => {
            warn!("command timed out, killing");
            child.kill().map_err(spawn_err)?;
            child.wait().map_err(spawn_err)?;
            return Err(StepError::CommandTimedOut {
                command: command.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    debug!(exit_code = ?status.code(), "command finished");
    if !status.success() {
        return Err(StepError::Command {
            command: command.to_string(),
            exit_code: status.code(),
        });
    }
    Ok(())
}
