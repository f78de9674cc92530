//! Stable exit codes for railsdock CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid invocation, configuration, or another error before any step ran.
pub const INVALID: i32 = 1;
/// A plan step failed; the project is partially mutated and needs inspection.
pub const STEP_FAILED: i32 = 2;
