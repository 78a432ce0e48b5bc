//! Error types for policy assembly.

use chaos_core::SynthError;
use thiserror::Error;

/// Errors raised while building statements or declaring IAM resources.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A statement was built without any action.
    #[error("a policy statement must list at least one action")]
    EmptyActions,

    /// A statement was built without any resource.
    #[error("a policy statement must list at least one resource")]
    EmptyResources,

    /// A trust relationship was composed from no principal.
    #[error("a trust relationship must name at least one principal")]
    EmptyPrincipals,

    /// Declaring the IAM resource in its stack failed.
    #[error(transparent)]
    Synth(#[from] SynthError),
}
