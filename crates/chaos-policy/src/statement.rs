//! Policy statements.
//!
//! A [`PolicyStatement`] is an immutable grant: ordered actions, ordered
//! resource patterns and optional conditions. Statements are built with
//! [`PolicyStatement::builder`], which rejects empty action and resource
//! lists. Action names and ARN syntax are not validated.

use chaos_core::Token;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::condition::{ConditionOperator, Conditions, SingleOrMany};
use crate::error::PolicyError;
use crate::pattern::glob_matches;

/// Whether a statement grants or denies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

/// One statement of an identity policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    sid: Option<String>,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<Token>,
    conditions: Conditions,
}

impl PolicyStatement {
    pub fn builder() -> PolicyStatementBuilder {
        PolicyStatementBuilder::default()
    }

    /// Allow `actions` on `resources`, the common case.
    pub fn allow<A, R>(actions: A, resources: R) -> Result<Self, PolicyError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<Token>,
    {
        Self::builder().actions(actions).resources(resources).build()
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[Token] {
        &self.resources
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// True when some action pattern of this statement covers `action`.
    pub fn covers_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| glob_matches(a, action))
    }

    /// True when some literal resource pattern covers `arn`. Deferred
    /// resources only cover themselves.
    pub fn covers_resource(&self, arn: &Token) -> bool {
        self.resources.iter().any(|r| match (r.as_literal(), arn.as_literal()) {
            (Some(pattern), Some(value)) => glob_matches(pattern, value),
            _ => r == arn,
        })
    }
}

impl Serialize for PolicyStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(sid) = &self.sid {
            map.serialize_entry("Sid", sid)?;
        }
        map.serialize_entry("Action", &SingleOrMany(&self.actions))?;
        if !self.conditions.is_empty() {
            map.serialize_entry("Condition", &self.conditions)?;
        }
        map.serialize_entry("Effect", &self.effect)?;
        map.serialize_entry("Resource", &SingleOrMany(&self.resources))?;
        map.end()
    }
}

/// Builder for [`PolicyStatement`].
///
/// Duplicate actions and resources are dropped, first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct PolicyStatementBuilder {
    sid: Option<String>,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<Token>,
    conditions: Conditions,
}

impl PolicyStatementBuilder {
    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
        self
    }

    pub fn actions<I>(self, actions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        actions.into_iter().fold(self, |b, a| b.action(a))
    }

    pub fn resource(mut self, resource: impl Into<Token>) -> Self {
        let resource = resource.into();
        if !self.resources.contains(&resource) {
            self.resources.push(resource);
        }
        self
    }

    pub fn resources<I>(self, resources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Token>,
    {
        resources.into_iter().fold(self, |b, r| b.resource(r))
    }

    /// Shorthand for `resource("*")`.
    pub fn all_resources(self) -> Self {
        self.resource("*")
    }

    pub fn condition(
        mut self,
        operator: ConditionOperator,
        key: impl Into<String>,
        value: impl Into<Token>,
    ) -> Self {
        self.conditions.add(operator, key, value);
        self
    }

    pub fn conditions(mut self, conditions: &Conditions) -> Self {
        self.conditions.merge(conditions);
        self
    }

    pub fn build(self) -> Result<PolicyStatement, PolicyError> {
        if self.actions.is_empty() {
            return Err(PolicyError::EmptyActions);
        }
        if self.resources.is_empty() {
            return Err(PolicyError::EmptyResources);
        }
        Ok(PolicyStatement {
            sid: self.sid,
            effect: self.effect,
            actions: self.actions,
            resources: self.resources,
            conditions: self.conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::LogicalId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_lists_rejected() {
        assert!(matches!(
            PolicyStatement::builder().resource("*").build(),
            Err(PolicyError::EmptyActions)
        ));
        assert!(matches!(
            PolicyStatement::builder().action("logs:PutLogEvents").build(),
            Err(PolicyError::EmptyResources)
        ));
        assert!(matches!(
            PolicyStatement::allow(Vec::<String>::new(), ["*"]),
            Err(PolicyError::EmptyActions)
        ));
    }

    #[test]
    fn test_order_preserved_and_duplicates_dropped() {
        let statement = PolicyStatement::builder()
            .actions(["lambda:PutFunctionConcurrency", "lambda:DeleteFunctionConcurrency"])
            .action("lambda:PutFunctionConcurrency")
            .resources(["b", "a", "b"])
            .build()
            .unwrap();
        assert_eq!(
            statement.actions(),
            ["lambda:PutFunctionConcurrency", "lambda:DeleteFunctionConcurrency"]
        );
        assert_eq!(statement.resources(), [Token::literal("b"), Token::literal("a")]);
    }

    #[test]
    fn test_serialize() {
        let role = LogicalId::new("AutomationRole");
        let statement = PolicyStatement::builder()
            .action("iam:PassRole")
            .resource(Token::get_att(&role, "Arn"))
            .condition(
                ConditionOperator::StringEquals,
                "iam:PassedToService",
                "ssm.amazonaws.com",
            )
            .build()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&statement).unwrap(),
            json!({
                "Action": "iam:PassRole",
                "Condition": { "StringEquals": { "iam:PassedToService": "ssm.amazonaws.com" } },
                "Effect": "Allow",
                "Resource": { "Fn::GetAtt": ["AutomationRole", "Arn"] }
            })
        );

        let many = PolicyStatement::allow(["logs:CreateLogStream", "logs:PutLogEvents"], ["*"])
            .unwrap();
        assert_eq!(
            serde_json::to_value(&many).unwrap(),
            json!({
                "Action": ["logs:CreateLogStream", "logs:PutLogEvents"],
                "Effect": "Allow",
                "Resource": "*"
            })
        );
    }

    #[test]
    fn test_covers() {
        let statement = PolicyStatement::allow(
            ["lambda:Get*"],
            ["arn:aws:lambda:us-east-1:111122223333:function:*"],
        )
        .unwrap();
        assert!(statement.covers_action("lambda:GetFunction"));
        assert!(!statement.covers_action("lambda:UpdateFunctionConfiguration"));
        assert!(statement.covers_resource(&Token::literal(
            "arn:aws:lambda:us-east-1:111122223333:function:demo-Func"
        )));

        let id = LogicalId::new("Fn");
        assert!(!statement.covers_resource(&Token::get_att(&id, "Arn")));
    }
}
