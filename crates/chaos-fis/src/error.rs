//! Error types for experiment assembly.

use chaos_core::SynthError;
use chaos_policy::PolicyError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or parsing an automation document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read automation document '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse automation document '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but is not a usable Automation document.
    #[error("invalid automation document '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Errors raised while declaring an experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}
