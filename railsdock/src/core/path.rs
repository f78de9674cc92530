//! Lexical confinement of project-relative paths.

use std::path::{Component, Path, PathBuf};

use crate::error::StepError;

/// Resolve `relative` against `root`, refusing anything that leaves `root`.
///
/// Resolution is purely lexical: absolute paths, drive prefixes, and `..`
/// components that climb above the root are rejected. An empty path (or one
/// that normalizes to nothing) resolves to `root` itself. Symlinks are checked
/// separately by `io::fs_ops::confined_path`.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, StepError> {
    let escape = || StepError::PathEscapesRoot {
        path: relative.to_string(),
    };
    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(root.join(normalized))
}
