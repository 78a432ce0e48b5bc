//! CLI command implementations for the `chaos` binary.

pub mod check;
pub mod list;
pub mod show;
pub mod synth;
