//! Scaffold a Docker development environment onto an existing Rails project.
//!
//! The work is a fixed, ordered plan of file writes, appends, pattern
//! replacements, and version-control checkpoints. The crate keeps a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step model, plan builder,
//!   path confinement, text replacement). No I/O.
//! - **[`io`]**: Side-effecting adapters (filesystem, shell, git, config).
//! - **[`assets`]**: Compiled-in payloads written by the plan.
//!
//! [`apply`] coordinates core with I/O: it runs a plan against a project root,
//! stopping at the first failed step.

pub mod apply;
pub mod assets;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
