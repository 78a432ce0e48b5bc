//! Error types for synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring resources or writing synthesized output.
///
/// Any of these aborts synthesis of the affected stack; no partial template
/// is written.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Two siblings in the construct tree share an id.
    #[error("there is already a construct with id '{id}' under '{parent}'")]
    DuplicateConstructId { parent: String, id: String },

    /// A construct id is empty or contains a path separator.
    #[error("invalid construct id '{0}': ids must be non-empty and must not contain '/'")]
    InvalidConstructId(String),

    /// A node handle issued by another construct tree, or the root where a
    /// child is required.
    #[error("construct '{0}' does not belong to this stack")]
    ForeignConstruct(String),

    /// Two resources in one template resolved to the same logical id.
    #[error("duplicate logical id '{logical_id}' (from '{path}')")]
    DuplicateLogicalId { logical_id: String, path: String },

    /// Two stacks in one app share a name.
    #[error("duplicate stack name '{0}'")]
    DuplicateStack(String),

    /// A stack name CloudFormation would reject.
    #[error("invalid stack name '{0}': must start with a letter and contain only letters, digits and '-'")]
    InvalidStackName(String),

    /// Lookup of a stack that was never added.
    #[error("unknown stack '{0}'")]
    UnknownStack(String),

    /// Lookup of a resource that was never declared.
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    /// An escape-hatch override path could not be applied.
    #[error("cannot apply override '{path}': {reason}")]
    InvalidOverride { path: String, reason: String },

    /// Writing output failed.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
