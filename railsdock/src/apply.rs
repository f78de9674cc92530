//! Orchestration for applying a plan to a project root.
//!
//! Steps run strictly in order. The first failure aborts the plan with its
//! position and description; already-applied steps are not rolled back, so
//! the project is left exactly as it was at the point of failure.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::step::{Plan, Step};
use crate::error::{ApplyError, StepError};
use crate::io::config::{CheckpointPolicy, RailsdockConfig};
use crate::io::fs_ops::{ReplaceOutcome, append_file, replace_text, write_file};
use crate::io::shell::run_shell;
use crate::io::vcs::VersionControl;

/// Execution knobs that are not part of the plan itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    pub checkpoints: CheckpointPolicy,
    pub shell_timeout: Duration,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self::from(&RailsdockConfig::default())
    }
}

impl From<&RailsdockConfig> for ApplyOptions {
    fn from(cfg: &RailsdockConfig) -> Self {
        Self {
            checkpoints: cfg.checkpoints,
            shell_timeout: cfg.shell_timeout(),
        }
    }
}

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEffect {
    Wrote,
    Appended,
    Replaced,
    /// Best-effort replacement found no match.
    Unchanged,
    Ran,
    Committed,
}

/// A checkpoint that failed under [`CheckpointPolicy::BestEffort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCheckpoint {
    pub index: usize,
    pub message: String,
    pub reason: String,
}

/// Summary of a fully applied plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Number of steps that ran (equals the plan length on success).
    pub applied: usize,
    /// Indices of best-effort replacements that matched nothing.
    pub unchanged: Vec<usize>,
    pub checkpoints_committed: usize,
    pub skipped_checkpoints: Vec<SkippedCheckpoint>,
}

/// Apply one step to `root`.
pub fn apply_step<V: VersionControl + ?Sized>(
    root: &Path,
    step: &Step,
    vcs: &V,
    options: &ApplyOptions,
) -> Result<StepEffect, StepError> {
    match step {
        Step::WriteFile {
            target_path,
            content,
            executable,
        } => {
            write_file(root, target_path, content, *executable)?;
            Ok(StepEffect::Wrote)
        }
        Step::AppendFile {
            target_path,
            content,
        } => {
            append_file(root, target_path, content)?;
            Ok(StepEffect::Appended)
        }
        Step::ReplaceText {
            target_path,
            pattern,
            replacement,
            mode,
        } => match replace_text(root, target_path, pattern, replacement, *mode)? {
            ReplaceOutcome::Replaced => Ok(StepEffect::Replaced),
            ReplaceOutcome::NoMatch => Ok(StepEffect::Unchanged),
        },
        Step::RunShell {
            command,
            working_subdirectory,
        } => {
            run_shell(
                root,
                command,
                working_subdirectory.as_deref(),
                options.shell_timeout,
            )?;
            Ok(StepEffect::Ran)
        }
        Step::Checkpoint {
            message,
            initialize_repository,
        } => {
            checkpoint(vcs, message, *initialize_repository).map_err(|cause| {
                StepError::Checkpoint {
                    message: message.clone(),
                    cause,
                }
            })?;
            Ok(StepEffect::Committed)
        }
    }
}

fn checkpoint<V: VersionControl + ?Sized>(
    vcs: &V,
    message: &str,
    initialize_repository: bool,
) -> anyhow::Result<()> {
    if initialize_repository {
        vcs.init()?;
    }
    vcs.add(".")?;
    vcs.commit(message)
}

/// Apply every step of `plan` to `root`, stopping at the first failure.
pub fn apply_plan<V: VersionControl + ?Sized>(
    root: &Path,
    plan: &Plan,
    vcs: &V,
    options: &ApplyOptions,
) -> Result<ApplyOutcome, ApplyError> {
    let total = plan.len();
    let mut outcome = ApplyOutcome::default();
    info!(root = %root.display(), steps = total, "applying plan");

    for (index, step) in plan.steps().iter().enumerate() {
        let description = step.describe();
        debug!(step = index + 1, total, %description, "applying step");

        match apply_step(root, step, vcs, options) {
            Ok(StepEffect::Unchanged) => outcome.unchanged.push(index),
            Ok(StepEffect::Committed) => outcome.checkpoints_committed += 1,
            Ok(_) => {}
            Err(StepError::Checkpoint { message, cause })
                if options.checkpoints == CheckpointPolicy::BestEffort =>
            {
                let reason = format!("{cause:#}");
                warn!(step = index + 1, %message, %reason, "checkpoint failed, continuing");
                outcome.skipped_checkpoints.push(SkippedCheckpoint {
                    index,
                    message,
                    reason,
                });
            }
            Err(source) => {
                warn!(step = index + 1, kind = %source.kind(), "step failed, aborting plan");
                return Err(ApplyError {
                    index,
                    total,
                    description,
                    source,
                });
            }
        }
        outcome.applied += 1;
    }

    info!(
        applied = outcome.applied,
        checkpoints = outcome.checkpoints_committed,
        "plan applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::MatchMode;
    use crate::error::FailureKind;
    use crate::test_support::{RecordingVcs, VcsCall};
    use std::fs;

    #[test]
    fn later_steps_see_earlier_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let plan = Plan::new(vec![
            Step::write("notes.txt", "alpha\n"),
            Step::replace("notes.txt", "^alpha$", "beta", MatchMode::Strict),
            Step::append("notes.txt", "gamma\n"),
        ]);

        let outcome =
            apply_plan(root, &plan, &RecordingVcs::new(), &ApplyOptions::default()).expect("apply");
        assert_eq!(outcome.applied, 3);
        assert_eq!(
            fs::read_to_string(root.join("notes.txt")).expect("read"),
            "beta\ngamma\n"
        );
    }

    #[test]
    fn failure_reports_index_and_stops() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let plan = Plan::new(vec![
            Step::write("a.txt", "a"),
            Step::append("missing.txt", "x"),
            Step::write("b.txt", "b"),
        ]);

        let err = apply_plan(root, &plan, &RecordingVcs::new(), &ApplyOptions::default())
            .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.total, 3);
        assert_eq!(err.description, "append to missing.txt");
        assert_eq!(err.kind(), FailureKind::MissingFile);
        assert!(root.join("a.txt").is_file());
        assert!(!root.join("b.txt").exists());
    }

    #[test]
    fn checkpoint_initializes_then_stages_and_commits() {
        let temp = tempfile::tempdir().expect("tempdir");
        let vcs = RecordingVcs::new();
        let plan = Plan::new(vec![
            Step::initial_checkpoint("Initial commit"),
            Step::write("a.txt", "a"),
            Step::checkpoint("Add a"),
        ]);

        let outcome =
            apply_plan(temp.path(), &plan, &vcs, &ApplyOptions::default()).expect("apply");
        assert_eq!(outcome.checkpoints_committed, 2);
        assert_eq!(
            vcs.calls(),
            vec![
                VcsCall::Init,
                VcsCall::Add(".".to_string()),
                VcsCall::Commit("Initial commit".to_string()),
                VcsCall::Add(".".to_string()),
                VcsCall::Commit("Add a".to_string()),
            ]
        );
    }

    #[test]
    fn strict_checkpoint_failure_aborts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let vcs = RecordingVcs::rejecting_commits("hook rejected");
        let plan = Plan::new(vec![
            Step::write("a.txt", "a"),
            Step::checkpoint("Add a"),
            Step::write("b.txt", "b"),
        ]);
        let options = ApplyOptions {
            checkpoints: CheckpointPolicy::Strict,
            ..ApplyOptions::default()
        };

        let err = apply_plan(temp.path(), &plan, &vcs, &options).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.kind(), FailureKind::Checkpoint);
        assert!(err.to_string().contains("hook rejected"));
        assert!(!temp.path().join("b.txt").exists());
    }

    #[test]
    fn best_effort_checkpoint_failure_is_recorded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let vcs = RecordingVcs::rejecting_commits("nothing to commit");
        let plan = Plan::new(vec![Step::checkpoint("Add a"), Step::write("b.txt", "b")]);
        let options = ApplyOptions {
            checkpoints: CheckpointPolicy::BestEffort,
            ..ApplyOptions::default()
        };

        let outcome = apply_plan(temp.path(), &plan, &vcs, &options).expect("apply");
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.checkpoints_committed, 0);
        assert_eq!(
            outcome.skipped_checkpoints,
            vec![SkippedCheckpoint {
                index: 0,
                message: "Add a".to_string(),
                reason: "nothing to commit".to_string(),
            }]
        );
        assert!(temp.path().join("b.txt").is_file());
    }

    #[test]
    fn best_effort_replacements_are_reported_unchanged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let plan = Plan::new(vec![
            Step::write("Gemfile", "gem 'rails'\n"),
            Step::replace("Gemfile", "^ruby .*$", "ruby '3'", MatchMode::BestEffort),
        ]);

        let outcome = apply_plan(
            temp.path(),
            &plan,
            &RecordingVcs::new(),
            &ApplyOptions::default(),
        )
        .expect("apply");
        assert_eq!(outcome.unchanged, vec![1]);
    }

    #[cfg(unix)]
    #[test]
    fn shell_failure_carries_exit_code() {
        let temp = tempfile::tempdir().expect("tempdir");
        let plan = Plan::new(vec![Step::shell("exit 3")]);

        let err = apply_plan(
            temp.path(),
            &plan,
            &RecordingVcs::new(),
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Command);
        assert_eq!(err.source.exit_code(), Some(3));
    }
}
