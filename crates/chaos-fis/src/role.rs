//! The two roles every experiment needs.
//!
//! FIS assumes the experiment role to start the automation; SSM assumes the
//! automation role to run the document's steps against the target.

use chaos_core::{NodeId, Stack, arn};
use chaos_policy::{
    ConditionOperator, FIS_SERVICE, IAM_SERVICE, PolicyError, PolicyStatement, Role, RoleProps,
    SSM_SERVICE, ServicePrincipal, TrustRelationship,
};
use chaos_resources::LogGroup;
use serde_json::json;

use crate::document::AutomationDocument;

/// Actions the automation role needs to write execution logs. None of them
/// support resource-level permissions beyond the account.
pub const AUTOMATION_LOGGING_ACTIONS: [&str; 5] = [
    "logs:CreateLogStream",
    "logs:CreateLogGroup",
    "logs:PutLogEvents",
    "logs:DescribeLogGroups",
    "logs:DescribeLogStreams",
];

/// Declare the role SSM assumes while running an automation document.
///
/// `grants` are added first, followed by the logging statement.
pub fn automation_role<I>(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    role_name: &str,
    grants: I,
) -> Result<Role, PolicyError>
where
    I: IntoIterator<Item = PolicyStatement>,
{
    let trust = TrustRelationship::compose([
        ServicePrincipal::new(IAM_SERVICE),
        ServicePrincipal::new(SSM_SERVICE),
    ])?;
    let mut role = Role::declare(stack, parent, id, RoleProps::new(trust).role_name(role_name))?;

    // SSM validates the first principal of the trust policy when the
    // document's assumeRole is resolved.
    role.add_override(
        stack,
        "Properties.AssumeRolePolicyDocument.Statement.0.Principal.Service",
        json!([SSM_SERVICE, IAM_SERVICE]),
    )?;

    for grant in grants {
        role.add_to_policy(stack, grant)?;
    }
    role.add_to_policy(stack, PolicyStatement::allow(AUTOMATION_LOGGING_ACTIONS, ["*"])?)?;
    Ok(role)
}

/// Declare the role FIS assumes to run an experiment.
///
/// FIS may only assume it for experiments of the stack's own account. The
/// role can start and stop executions of `document`, pass `automation_role`
/// to SSM and nothing else, and deliver logs to `log_group`.
pub fn fis_role(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    role_name: &str,
    document: &AutomationDocument,
    automation_role: &Role,
    log_group: &LogGroup,
) -> Result<Role, PolicyError> {
    let ctx = stack.context().clone();
    let trust = TrustRelationship::compose([ServicePrincipal::new(FIS_SERVICE)
        .with_condition(ConditionOperator::StringEquals, "aws:SourceAccount", ctx.account())
        .with_condition(
            ConditionOperator::ArnLike,
            "aws:SourceArn",
            arn::fis_experiment(&ctx, "*"),
        )])?;
    let mut role = Role::declare(stack, parent, id, RoleProps::new(trust).role_name(role_name))?;

    role.add_to_policy(
        stack,
        PolicyStatement::allow(
            [
                "ssm:StartAutomationExecution",
                "ssm:StopAutomationExecution",
                "ssm:GetAutomationExecution",
            ],
            [document.automation_definition_arn()],
        )?,
    )?;
    role.add_to_policy(
        stack,
        PolicyStatement::allow(
            ["ssm:StopAutomationExecution", "ssm:GetAutomationExecution"],
            [arn::ssm_automation_execution(&ctx, "*")],
        )?,
    )?;
    role.add_to_policy(
        stack,
        PolicyStatement::builder()
            .action("iam:PassRole")
            .resource(automation_role.arn())
            .condition(
                ConditionOperator::StringEquals,
                "iam:PassedToService",
                SSM_SERVICE,
            )
            .build()?,
    )?;
    role.add_to_policy(
        stack,
        PolicyStatement::allow(["logs:CreateLogDelivery"], ["*"])?,
    )?;
    role.add_to_policy(
        stack,
        PolicyStatement::allow(
            [
                "logs:PutResourcePolicy",
                "logs:DescribeResourcePolicies",
                "logs:DescribeLogGroups",
            ],
            [log_group.arn()],
        )?,
    )?;

    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AutomationContent, BuiltinDocument};
    use chaos_core::{Environment, Token};
    use chaos_policy::AssumeRoleRequest;
    use chaos_resources::LogGroupProps;

    fn pinned_stack() -> Stack {
        Stack::new(
            "Demo",
            Environment::new(Some("111122223333".into()), Some("us-east-1".into())),
        )
        .unwrap()
    }

    #[test]
    fn test_automation_role_trust_and_logging() {
        let mut stack = pinned_stack();
        let root = stack.root();
        let role = automation_role(&mut stack, root, "ssma-role", "ssmaRole", []).unwrap();

        assert!(role.trust().trusts(SSM_SERVICE));
        assert!(role.trust().trusts(IAM_SERVICE));
        let statements = role.policy_document().statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].resources(), [Token::literal("*")]);

        let template = stack.to_template_json().unwrap();
        let service = &template["Resources"][role.logical_id().as_str()]["Properties"]
            ["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"];
        assert_eq!(*service, json!(["ssm.amazonaws.com", "iam.amazonaws.com"]));
    }

    #[test]
    fn test_fis_role_is_scoped() {
        let mut stack = pinned_stack();
        let root = stack.root();
        let content = AutomationContent::load(BuiltinDocument::PutConcurrency, None).unwrap();
        let document =
            AutomationDocument::declare(&mut stack, root, "doc", "Doc", &content).unwrap();
        let automation = automation_role(&mut stack, root, "ssma-role", "ssmaRole", []).unwrap();
        let logs = LogGroup::declare(
            &mut stack,
            root,
            "logs",
            LogGroupProps::experiment_logs("/aws/fis/experiment/demo1"),
        )
        .unwrap();

        let role = fis_role(
            &mut stack,
            root,
            "fis-demo1-role",
            "fis-demo1-role",
            &document,
            &automation,
            &logs,
        )
        .unwrap();

        let ctx = stack.context().clone();
        let own = AssumeRoleRequest::new(FIS_SERVICE)
            .with_context("aws:SourceAccount", "111122223333")
            .with_context(
                "aws:SourceArn",
                "arn:aws:fis:us-east-1:111122223333:experiment/EXP123",
            );
        assert!(role.trust().accepts(&own, &ctx));
        let foreign = AssumeRoleRequest::new(FIS_SERVICE)
            .with_context("aws:SourceAccount", "444455556666")
            .with_context(
                "aws:SourceArn",
                "arn:aws:fis:us-east-1:444455556666:experiment/EXP123",
            );
        assert!(!role.trust().accepts(&foreign, &ctx));

        let statements = role.policy_document().statements();
        let pass_role = statements
            .iter()
            .find(|s| s.covers_action("iam:PassRole"))
            .unwrap();
        assert_eq!(pass_role.resources(), [automation.arn().clone()]);
        assert!(pass_role.conditions().has_key("iam:PassedToService"));
        assert!(
            statements
                .iter()
                .filter(|s| s.covers_action("ssm:StartAutomationExecution"))
                .all(|s| s.resources() == [document.automation_definition_arn().clone()])
        );
    }
}
