//! First-match literal substitution over raw file bytes.
//!
//! Targets are matched as bytes so that files carrying non-UTF-8 text (a
//! Latin-1 comment in a Gemfile, say) can still be edited.

use regex::bytes::{Regex, RegexBuilder};

use crate::error::StepError;

/// Compile a replacement pattern.
///
/// The whole file is matched at once, with `^` and `$` anchoring at line
/// boundaries so that patterns may span several lines.
pub fn compile_pattern(pattern: &str) -> Result<Regex, StepError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| StepError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Replace the first match of `pattern` in `content` with `replacement`.
///
/// The replacement is inserted verbatim (`$1` is not expanded). Returns `None`
/// when the pattern does not match.
pub fn replace_first(content: &[u8], pattern: &Regex, replacement: &[u8]) -> Option<Vec<u8>> {
    let found = pattern.find(content)?;
    let mut out = Vec::with_capacity(content.len() - found.len() + replacement.len());
    out.extend_from_slice(&content[..found.start()]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&content[found.end()..]);
    Some(out)
}
