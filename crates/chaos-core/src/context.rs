//! Explicit synthesis context.
//!
//! Account and region are never read from a global: every constructor that
//! needs them receives a [`StackContext`]. When the environment does not pin
//! a value, the context hands out the matching pseudo-parameter token and
//! the deployment engine fills it in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::token::{Pseudo, Token};

/// Partition used when none is configured.
pub const DEFAULT_PARTITION: &str = "aws";

/// Target account/region of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Account id. `None` leaves `AWS::AccountId` deferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Region. `None` leaves `AWS::Region` deferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// ARN partition (`aws`, `aws-cn`, `aws-us-gov`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
}

impl Environment {
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account,
            region,
            partition: None,
        }
    }

    /// An environment that pins nothing.
    pub fn agnostic() -> Self {
        Self::default()
    }

    pub fn partition(&self) -> &str {
        self.partition.as_deref().unwrap_or(DEFAULT_PARTITION)
    }

    /// Overlay the values set in `other` on top of this environment.
    pub fn merged_with(&self, other: &Environment) -> Environment {
        Environment {
            account: other.account.clone().or_else(|| self.account.clone()),
            region: other.region.clone().or_else(|| self.region.clone()),
            partition: other.partition.clone().or_else(|| self.partition.clone()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

/// Per-stack context passed to every resource constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackContext {
    stack_name: String,
    environment: Environment,
}

impl StackContext {
    pub fn new(stack_name: impl Into<String>, environment: Environment) -> Self {
        Self {
            stack_name: stack_name.into(),
            environment,
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Account id, literal when pinned.
    pub fn account(&self) -> Token {
        match &self.environment.account {
            Some(account) => Token::literal(account),
            None => Token::Pseudo(Pseudo::AccountId),
        }
    }

    /// Region, literal when pinned.
    pub fn region(&self) -> Token {
        match &self.environment.region {
            Some(region) => Token::literal(region),
            None => Token::Pseudo(Pseudo::Region),
        }
    }

    pub fn partition(&self) -> Token {
        Token::literal(self.environment.partition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agnostic_context_defers_account_and_region() {
        let ctx = StackContext::new("Demo", Environment::agnostic());
        assert_eq!(ctx.account(), Token::Pseudo(Pseudo::AccountId));
        assert_eq!(ctx.region(), Token::Pseudo(Pseudo::Region));
        assert_eq!(ctx.partition(), Token::literal("aws"));
    }

    #[test]
    fn test_merged_with_prefers_override() {
        let base = Environment::new(Some("111122223333".into()), Some("eu-west-1".into()));
        let overlay = Environment::new(None, Some("us-east-1".into()));
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.account.as_deref(), Some("111122223333"));
        assert_eq!(merged.region.as_deref(), Some("us-east-1"));
        assert_eq!(merged.to_string(), "aws://111122223333/us-east-1");
    }
}
