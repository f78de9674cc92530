//! Filesystem mutations confined to a project root.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::core::path::resolve_within;
use crate::core::replace::{compile_pattern, replace_first};
use crate::core::step::MatchMode;
use crate::error::StepError;

/// What a replacement did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    /// Best-effort mode found nothing to replace; the file is untouched.
    NoMatch,
}

/// Write `content` to `target` (overwriting), creating parent directories.
///
/// The executable bits are set when `executable` is true and cleared otherwise.
#[instrument(skip(root, content), fields(bytes = content.len()))]
pub fn write_file(
    root: &Path,
    target: &str,
    content: &str,
    executable: bool,
) -> Result<PathBuf, StepError> {
    let path = confined_path(root, target)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StepError::io(parent, source))?;
    }
    fs::write(&path, content).map_err(|source| StepError::io(&path, source))?;
    set_executable(&path, executable)?;
    debug!(path = %path.display(), "file written");
    Ok(path)
}

/// Append `content` to the end of an existing file, byte-for-byte.
#[instrument(skip(root, content), fields(bytes = content.len()))]
pub fn append_file(root: &Path, target: &str, content: &str) -> Result<PathBuf, StepError> {
    let path = existing_file(root, target)?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(&path)
        .map_err(|source| StepError::io(&path, source))?;
    file.write_all(content.as_bytes())
        .map_err(|source| StepError::io(&path, source))?;
    debug!(path = %path.display(), "content appended");
    Ok(path)
}

/// Replace the first match of `pattern` in an existing file.
///
/// The file is rewritten only when a match is found, through a temp file and
/// rename so a failed write never leaves a truncated target behind.
#[instrument(skip(root, replacement))]
pub fn replace_text(
    root: &Path,
    target: &str,
    pattern: &str,
    replacement: &str,
    mode: MatchMode,
) -> Result<ReplaceOutcome, StepError> {
    let path = existing_file(root, target)?;
    let regex = compile_pattern(pattern)?;
    let contents = fs::read(&path).map_err(|source| StepError::io(&path, source))?;
    let Some(updated) = replace_first(&contents, &regex, replacement.as_bytes()) else {
        return match mode {
            MatchMode::Strict => Err(StepError::PatternNotFound {
                path,
                pattern: pattern.to_string(),
            }),
            MatchMode::BestEffort => {
                debug!(path = %path.display(), "no match, leaving file unchanged");
                Ok(ReplaceOutcome::NoMatch)
            }
        };
    };
    write_atomic(&path, &updated)?;
    debug!(path = %path.display(), "pattern replaced");
    Ok(ReplaceOutcome::Replaced)
}

/// Resolve `target` under `root`, following symlinks on the existing part of
/// the path so that a linked directory cannot redirect writes outside `root`.
///
/// A dangling symlink along the way is rejected, since writing through it
/// would create its target wherever it points.
pub(crate) fn confined_path(root: &Path, target: &str) -> Result<PathBuf, StepError> {
    let path = resolve_within(root, target)?;
    let canonical_root = fs::canonicalize(root).map_err(|source| StepError::io(root, source))?;
    let escape = || StepError::PathEscapesRoot {
        path: target.to_string(),
    };

    let mut existing = path.as_path();
    loop {
        match fs::canonicalize(existing) {
            Ok(canonical) if canonical.starts_with(&canonical_root) => return Ok(path),
            Ok(_) => return Err(escape()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if fs::symlink_metadata(existing).is_ok() {
                    return Err(escape());
                }
                match existing.parent() {
                    Some(parent) => existing = parent,
                    None => return Ok(path),
                }
            }
            Err(source) => return Err(StepError::io(existing, source)),
        }
    }
}

fn existing_file(root: &Path, target: &str) -> Result<PathBuf, StepError> {
    let path = confined_path(root, target)?;
    if !path.is_file() {
        return Err(StepError::MissingFile { path });
    }
    Ok(path)
}

/// Replace `path` through a temp sibling; the temp file never outlives a failure.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StepError> {
    let permissions = fs::metadata(path)
        .map_err(|source| StepError::io(path, source))?
        .permissions();
    let tmp_path = tmp_sibling(path);
    let result = fs::write(&tmp_path, contents)
        .and_then(|()| fs::set_permissions(&tmp_path, permissions))
        .and_then(|()| fs::rename(&tmp_path, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(StepError::io(path, source));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".railsdock.tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_executable(path: &Path, executable: bool) -> Result<(), StepError> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .map_err(|source| StepError::io(path, source))?
        .permissions();
    let mode = permissions.mode();
    let wanted = if executable {
        mode | 0o111
    } else {
        mode & !0o111
    };
    if wanted != mode {
        permissions.set_mode(wanted);
        fs::set_permissions(path, permissions).map_err(|source| StepError::io(path, source))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _executable: bool) -> Result<(), StepError> {
    Ok(())
}
