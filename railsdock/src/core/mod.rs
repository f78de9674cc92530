//! Deterministic, pure logic: the step model, the plan builder, and the
//! path/text helpers the executor relies on.
//!
//! Core modules must be free of I/O side effects.

pub mod path;
pub mod plan;
pub mod replace;
pub mod step;
