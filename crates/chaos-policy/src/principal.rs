//! Service principals and assume-role trust.
//!
//! A [`TrustRelationship`] is fixed when its role is declared. The principal
//! set is a union, so the order principals are composed in does not matter;
//! conditions from every principal are merged into one block that every
//! caller must satisfy.

use chaos_core::StackContext;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

use crate::condition::{ConditionOperator, Conditions, SingleOrMany};
use crate::document::POLICY_VERSION;
use crate::error::PolicyError;

/// Service principal of Fault Injection Service.
pub const FIS_SERVICE: &str = "fis.amazonaws.com";
/// Service principal of Systems Manager.
pub const SSM_SERVICE: &str = "ssm.amazonaws.com";
/// Service principal of IAM.
pub const IAM_SERVICE: &str = "iam.amazonaws.com";
/// Service principal of Lambda.
pub const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";

const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

/// An AWS service allowed to assume a role, with optional conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    service: String,
    conditions: Conditions,
}

impl ServicePrincipal {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            conditions: Conditions::new(),
        }
    }

    pub fn with_condition(
        mut self,
        operator: ConditionOperator,
        key: impl Into<String>,
        value: impl Into<chaos_core::Token>,
    ) -> Self {
        self.conditions.add(operator, key, value);
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }
}

/// A caller trying to assume a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub service: String,
    pub context: BTreeMap<String, String>,
}

impl AssumeRoleRequest {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Assume-role policy of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustRelationship {
    services: BTreeSet<String>,
    conditions: Conditions,
}

impl TrustRelationship {
    /// Union of the given principals.
    pub fn compose<I>(principals: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = ServicePrincipal>,
    {
        let mut services = BTreeSet::new();
        let mut conditions = Conditions::new();
        for principal in principals {
            conditions.merge(&principal.conditions);
            services.insert(principal.service);
        }
        if services.is_empty() {
            return Err(PolicyError::EmptyPrincipals);
        }
        Ok(Self {
            services,
            conditions,
        })
    }

    /// Trust for a single service without conditions.
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            services: BTreeSet::from([service.into()]),
            conditions: Conditions::new(),
        }
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(String::as_str)
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// True when `service` is one of the trusted principals.
    pub fn trusts(&self, service: &str) -> bool {
        self.services.contains(service)
    }

    /// Evaluate a request: the caller must be one of the principals and
    /// satisfy every condition.
    pub fn accepts(&self, request: &AssumeRoleRequest, ctx: &StackContext) -> bool {
        self.trusts(&request.service) && self.conditions.evaluate(&request.context, ctx)
    }

    /// Render the `AssumeRolePolicyDocument`.
    pub fn to_policy_document(&self) -> Value {
        let services: Vec<&str> = self.services().collect();
        let mut statement = serde_json::Map::new();
        statement.insert("Action".into(), json!(ASSUME_ROLE_ACTION));
        if !self.conditions.is_empty() {
            statement.insert("Condition".into(), json!(self.conditions));
        }
        statement.insert("Effect".into(), json!("Allow"));
        statement.insert(
            "Principal".into(),
            json!({ "Service": SingleOrMany(&services) }),
        );
        json!({
            "Statement": [Value::Object(statement)],
            "Version": POLICY_VERSION,
        })
    }
}
