//! Step and plan data model.
//!
//! A [`Plan`] is an ordered, immutable list of [`Step`]s. Steps carry all of
//! their payload up front (already rendered), so applying a plan never needs to
//! consult templates or configuration.

use serde::Serialize;

/// How a replacement treats a pattern that matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Zero matches is a `PatternNotFoundFailure`.
    Strict,
    /// Zero matches is a silent no-op.
    BestEffort,
}

/// Discriminant of a [`Step`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    WriteFile,
    AppendFile,
    ReplaceText,
    RunShell,
    Checkpoint,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::WriteFile => "write_file",
            StepKind::AppendFile => "append_file",
            StepKind::ReplaceText => "replace_text",
            StepKind::RunShell => "run_shell",
            StepKind::Checkpoint => "checkpoint",
        }
    }
}

/// One mutation instruction. Target paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    WriteFile {
        target_path: String,
        content: String,
        executable: bool,
    },
    AppendFile {
        target_path: String,
        content: String,
    },
    ReplaceText {
        target_path: String,
        /// Regex matched against the whole file; `^`/`$` anchor at line boundaries.
        pattern: String,
        /// Inserted literally (no capture-group expansion).
        replacement: String,
        mode: MatchMode,
    },
    RunShell {
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        working_subdirectory: Option<String>,
    },
    Checkpoint {
        message: String,
        /// Initialize the repository before staging (first checkpoint only).
        initialize_repository: bool,
    },
}

impl Step {
    pub fn write(target_path: impl Into<String>, content: impl Into<String>) -> Self {
        Step::WriteFile {
            target_path: target_path.into(),
            content: content.into(),
            executable: false,
        }
    }

    pub fn write_executable(target_path: impl Into<String>, content: impl Into<String>) -> Self {
        Step::WriteFile {
            target_path: target_path.into(),
            content: content.into(),
            executable: true,
        }
    }

    pub fn append(target_path: impl Into<String>, content: impl Into<String>) -> Self {
        Step::AppendFile {
            target_path: target_path.into(),
            content: content.into(),
        }
    }

    pub fn replace(
        target_path: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        mode: MatchMode,
    ) -> Self {
        Step::ReplaceText {
            target_path: target_path.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
            mode,
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Step::RunShell {
            command: command.into(),
            working_subdirectory: None,
        }
    }

    pub fn shell_in(command: impl Into<String>, subdirectory: impl Into<String>) -> Self {
        Step::RunShell {
            command: command.into(),
            working_subdirectory: Some(subdirectory.into()),
        }
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        Step::Checkpoint {
            message: message.into(),
            initialize_repository: false,
        }
    }

    pub fn initial_checkpoint(message: impl Into<String>) -> Self {
        Step::Checkpoint {
            message: message.into(),
            initialize_repository: true,
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::WriteFile { .. } => StepKind::WriteFile,
            Step::AppendFile { .. } => StepKind::AppendFile,
            Step::ReplaceText { .. } => StepKind::ReplaceText,
            Step::RunShell { .. } => StepKind::RunShell,
            Step::Checkpoint { .. } => StepKind::Checkpoint,
        }
    }

    /// Short human-readable description used in logs and failure reports.
    pub fn describe(&self) -> String {
        match self {
            Step::WriteFile {
                target_path,
                executable,
                ..
            } => {
                if *executable {
                    format!("write {target_path} (executable)")
                } else {
                    format!("write {target_path}")
                }
            }
            Step::AppendFile { target_path, .. } => format!("append to {target_path}"),
            Step::ReplaceText {
                target_path,
                pattern,
                mode,
                ..
            } => match mode {
                MatchMode::Strict => format!("replace /{pattern}/ in {target_path}"),
                MatchMode::BestEffort => {
                    format!("replace /{pattern}/ in {target_path} (best-effort)")
                }
            },
            Step::RunShell {
                command,
                working_subdirectory,
            } => match working_subdirectory {
                Some(dir) => format!("run `{command}` in {dir}"),
                None => format!("run `{command}`"),
            },
            Step::Checkpoint { message, .. } => format!("checkpoint \"{message}\""),
        }
    }
}

/// Ordered sequence of steps, applied strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Checkpoint messages, in plan order.
    pub fn checkpoint_messages(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Checkpoint { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}
