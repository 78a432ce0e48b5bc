//! The `chaos` command: demo stacks plus the commands that synthesize,
//! list, show and lint them.

pub mod commands;
pub mod demos;
