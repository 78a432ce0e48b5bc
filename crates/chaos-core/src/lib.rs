// Deferred values and the stack they resolve against
pub mod context;
pub mod token;

// ARN construction
pub mod arn;

// Scope hierarchy and logical ids
pub mod construct;

// Template model and synthesis
pub mod app;
pub mod stack;
pub mod template;

// Configuration types shared across all chaos crates
pub mod config;

pub mod error;

pub use app::{App, MANIFEST_FILE, Manifest, ManifestArtifact};
pub use arn::{ArnComponents, ArnError, ArnFormat, ParsedArn, ResourceIdentity};
pub use config::{ChaosConfig, ConfigError, DemosConfig};
pub use construct::{ConstructTree, LogicalId, NodeId};
pub use context::{Environment, StackContext};
pub use error::SynthError;
pub use stack::Stack;
pub use template::{CfnResource, Output, PATH_METADATA_KEY, RemovalPolicy, Template};
pub use token::{Pseudo, Token};
