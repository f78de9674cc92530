//! Side-effecting adapters: filesystem, shell, version control, config.

pub mod config;
pub mod fs_ops;
pub mod git;
pub mod shell;
pub mod vcs;
