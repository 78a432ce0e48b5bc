//! IAM policy assembly for chaos experiments.
//!
//! Statements grant ordered actions on ordered resources; trust
//! relationships restrict who may assume a role; roles collect statements
//! into their default policy. The [`lint`] module reports grants broader
//! than the experiments need.

pub mod condition;
pub mod document;
pub mod error;
pub mod lint;
pub mod pattern;
pub mod principal;
pub mod role;
pub mod statement;

pub use condition::{ConditionOperator, Conditions};
pub use document::{MAX_INLINE_POLICY_SIZE, POLICY_VERSION, PolicyDocument};
pub use error::PolicyError;
pub use lint::{
    Finding, FindingKind, LAMBDA_MUTATION_ACTIONS, LintReport, PolicyLinter, Severity,
};
pub use principal::{
    AssumeRoleRequest, FIS_SERVICE, IAM_SERVICE, LAMBDA_SERVICE, SSM_SERVICE, ServicePrincipal,
    TrustRelationship,
};
pub use role::{InlinePolicy, Role, RoleProps, aws_managed_policy};
pub use statement::{Effect, PolicyStatement, PolicyStatementBuilder};
