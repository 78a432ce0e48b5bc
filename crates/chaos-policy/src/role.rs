//! IAM roles and inline policies.
//!
//! [`Role::declare`] adds an `AWS::IAM::Role` to a stack. Statements added
//! afterwards with [`Role::add_to_policy`] go into the role's default
//! `AWS::IAM::Policy`, created on first use. Grants are append-only.

use chaos_core::{
    CfnResource, LogicalId, NodeId, Pseudo, ResourceIdentity, Stack, Token,
};
use serde_json::json;

use crate::document::PolicyDocument;
use crate::error::PolicyError;
use crate::principal::TrustRelationship;
use crate::statement::PolicyStatement;

pub const ROLE_TYPE: &str = "AWS::IAM::Role";
pub const POLICY_TYPE: &str = "AWS::IAM::Policy";

/// Settings of a role.
#[derive(Debug, Clone)]
pub struct RoleProps {
    pub role_name: Option<String>,
    pub description: Option<String>,
    pub trust: TrustRelationship,
    pub managed_policy_arns: Vec<Token>,
}

impl RoleProps {
    pub fn new(trust: TrustRelationship) -> Self {
        Self {
            role_name: None,
            description: None,
            trust,
            managed_policy_arns: Vec::new(),
        }
    }

    pub fn role_name(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn managed_policy(mut self, arn: impl Into<Token>) -> Self {
        self.managed_policy_arns.push(arn.into());
        self
    }
}

/// ARN of an AWS managed policy, partition-aware.
pub fn aws_managed_policy(name: &str) -> Token {
    Token::concat([
        Token::literal("arn:"),
        Token::Pseudo(Pseudo::Partition),
        Token::literal(format!(":iam::aws:policy/{}", name)),
    ])
}

/// A role declared in a stack.
#[derive(Debug, Clone)]
pub struct Role {
    scope: NodeId,
    logical_id: LogicalId,
    identity: ResourceIdentity,
    trust: TrustRelationship,
    default_policy: Option<LogicalId>,
    document: PolicyDocument,
}

impl Role {
    /// Declare the role under `parent` with construct id `id`.
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        props: RoleProps,
    ) -> Result<Self, PolicyError> {
        let scope = stack.scope(parent, id)?;

        let managed = (!props.managed_policy_arns.is_empty()).then_some(&props.managed_policy_arns);
        let resource = CfnResource::new(ROLE_TYPE)
            .with_property("AssumeRolePolicyDocument", props.trust.to_policy_document())?
            .with_optional_property("Description", props.description.as_ref())?
            .with_optional_property("ManagedPolicyArns", managed)?
            .with_optional_property("RoleName", props.role_name.as_ref())?;
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        tracing::debug!(
            role = %logical_id,
            name = props.role_name.as_deref().unwrap_or("<generated>"),
            "declared role"
        );

        Ok(Self {
            scope,
            identity: ResourceIdentity::new(
                Token::get_att(&logical_id, "Arn"),
                Token::reference(&logical_id),
            ),
            logical_id,
            trust: props.trust,
            default_policy: None,
            document: PolicyDocument::new(),
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn arn(&self) -> &Token {
        &self.identity.arn
    }

    pub fn name(&self) -> &Token {
        &self.identity.name
    }

    /// The stable unique id IAM assigns to the role.
    pub fn role_id(&self) -> Token {
        Token::get_att(&self.logical_id, "RoleId")
    }

    pub fn trust(&self) -> &TrustRelationship {
        &self.trust
    }

    /// Statements granted so far through the default policy.
    pub fn policy_document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Logical id of the default policy, once the first grant was added.
    pub fn default_policy(&self) -> Option<&LogicalId> {
        self.default_policy.as_ref()
    }

    /// Append a statement to the role's default policy.
    pub fn add_to_policy(
        &mut self,
        stack: &mut Stack,
        statement: PolicyStatement,
    ) -> Result<(), PolicyError> {
        self.document.add_statement(statement);

        let policy_id = match &self.default_policy {
            Some(id) => id.clone(),
            None => {
                let scope = stack.scope(self.scope, "DefaultPolicy")?;
                let mut resource = CfnResource::new(POLICY_TYPE)
                    .with_property("Roles", [Token::reference(&self.logical_id)])?;
                resource.add_dependency(&self.logical_id);
                let id = stack.add_resource(scope, "Resource", resource)?;
                stack
                    .resource_mut(&id)?
                    .set_property("PolicyName", id.as_str())?;
                self.default_policy = Some(id.clone());
                id
            }
        };

        stack
            .resource_mut(&policy_id)?
            .set_property("PolicyDocument", &self.document)?;
        Ok(())
    }

    /// Escape hatch on the underlying `AWS::IAM::Role`.
    pub fn add_override(
        &self,
        stack: &mut Stack,
        path: &str,
        value: serde_json::Value,
    ) -> Result<(), PolicyError> {
        stack.resource_mut(&self.logical_id)?.add_override(path, value);
        Ok(())
    }
}

/// A standalone policy attached to existing roles.
#[derive(Debug, Clone)]
pub struct InlinePolicy {
    logical_id: LogicalId,
    document: PolicyDocument,
}

impl InlinePolicy {
    /// Declare an `AWS::IAM::Policy` attached to `roles`.
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        statements: Vec<PolicyStatement>,
        roles: &[&Role],
    ) -> Result<Self, PolicyError> {
        let document = PolicyDocument::from_statements(statements);
        let scope = stack.scope(parent, id)?;
        let role_refs: Vec<Token> = roles.iter().map(|r| r.name().clone()).collect();

        let mut resource = CfnResource::new(POLICY_TYPE)
            .with_property("PolicyDocument", &document)?
            .with_property("Roles", json!(role_refs))?;
        for role in roles {
            resource.add_dependency(role.logical_id());
        }
        let logical_id = stack.add_resource(scope, "Resource", resource)?;
        stack
            .resource_mut(&logical_id)?
            .set_property("PolicyName", logical_id.as_str())?;

        Ok(Self {
            logical_id,
            document,
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{IAM_SERVICE, SSM_SERVICE, ServicePrincipal};
    use chaos_core::Environment;
    use pretty_assertions::assert_eq;

    fn automation_trust() -> TrustRelationship {
        TrustRelationship::compose([
            ServicePrincipal::new(IAM_SERVICE),
            ServicePrincipal::new(SSM_SERVICE),
        ])
        .unwrap()
    }

    #[test]
    fn test_declare_role() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let role = Role::declare(
            &mut stack,
            root,
            "AutomationRole",
            RoleProps::new(automation_trust()).role_name("ssmaPutConcurrencyRole"),
        )
        .unwrap();

        assert!(role.logical_id().as_str().starts_with("AutomationRole"));
        assert_eq!(role.arn(), &Token::get_att(role.logical_id(), "Arn"));
        assert!(role.default_policy().is_none());

        let template = stack.to_template_json().unwrap();
        let rendered = &template["Resources"][role.logical_id().as_str()];
        assert_eq!(rendered["Type"], "AWS::IAM::Role");
        assert_eq!(rendered["Properties"]["RoleName"], "ssmaPutConcurrencyRole");
        assert!(rendered["Properties"].get("ManagedPolicyArns").is_none());
    }

    #[test]
    fn test_add_to_policy_creates_default_policy_once() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let mut role =
            Role::declare(&mut stack, root, "Role", RoleProps::new(automation_trust())).unwrap();

        role.add_to_policy(
            &mut stack,
            PolicyStatement::allow(["lambda:PutFunctionConcurrency"], ["arn:x"]).unwrap(),
        )
        .unwrap();
        role.add_to_policy(
            &mut stack,
            PolicyStatement::allow(["logs:PutLogEvents"], ["*"]).unwrap(),
        )
        .unwrap();

        let policy_id = role.default_policy().unwrap().clone();
        assert!(policy_id.as_str().starts_with("RoleDefaultPolicy"));
        assert_eq!(stack.template().resources_of_type(POLICY_TYPE).count(), 1);

        let template = stack.to_template_json().unwrap();
        let policy = &template["Resources"][policy_id.as_str()];
        assert_eq!(policy["Properties"]["PolicyName"], policy_id.as_str());
        assert_eq!(
            policy["Properties"]["Roles"],
            json!([{ "Ref": role.logical_id().as_str() }])
        );
        assert_eq!(
            policy["Properties"]["PolicyDocument"]["Statement"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(policy["DependsOn"], json!([role.logical_id().as_str()]));
    }

    #[test]
    fn test_managed_policy_is_partition_aware() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let role = Role::declare(
            &mut stack,
            root,
            "ExecRole",
            RoleProps::new(TrustRelationship::service("lambda.amazonaws.com"))
                .managed_policy(aws_managed_policy("service-role/AWSLambdaBasicExecutionRole")),
        )
        .unwrap();

        let template = stack.to_template_json().unwrap();
        assert_eq!(
            template["Resources"][role.logical_id().as_str()]["Properties"]["ManagedPolicyArns"],
            json!([{
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"
                ]]
            }])
        );
    }

    #[test]
    fn test_escape_hatch_reorders_principals() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let role =
            Role::declare(&mut stack, root, "Role", RoleProps::new(automation_trust())).unwrap();
        role.add_override(
            &mut stack,
            "Properties.AssumeRolePolicyDocument.Statement.0.Principal.Service",
            json!(["ssm.amazonaws.com", "iam.amazonaws.com"]),
        )
        .unwrap();

        let template = stack.to_template_json().unwrap();
        assert_eq!(
            template["Resources"][role.logical_id().as_str()]["Properties"]
                ["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            json!(["ssm.amazonaws.com", "iam.amazonaws.com"])
        );
    }

    #[test]
    fn test_inline_policy() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let role =
            Role::declare(&mut stack, root, "Role", RoleProps::new(automation_trust())).unwrap();
        let policy = InlinePolicy::declare(
            &mut stack,
            root,
            "additional-ssm-policy",
            vec![
                PolicyStatement::allow(["ssm:GetParameter"], ["arn:aws:ssm:::parameter/x"])
                    .unwrap(),
            ],
            &[&role],
        )
        .unwrap();

        let template = stack.to_template_json().unwrap();
        let rendered = &template["Resources"][policy.logical_id().as_str()];
        assert_eq!(rendered["Type"], "AWS::IAM::Policy");
        assert_eq!(
            rendered["Properties"]["Roles"],
            json!([{ "Ref": role.logical_id().as_str() }])
        );
        assert_eq!(policy.document().statements().len(), 1);
    }
}
