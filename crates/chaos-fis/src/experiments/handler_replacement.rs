//! Replace a function's handler with the chaos handler of a layer.
//!
//! The chaos handler reads its fault configuration from an SSM parameter,
//! which the automation writes before swapping the handler.

use chaos_core::config::HandlerReplacementDemoConfig;
use chaos_core::{NodeId, Stack, Token, arn};
use chaos_policy::PolicyStatement;

use super::{DeclaredExperiment, ExperimentOptions, ExperimentTarget, Recipe, declare_recipe};
use crate::chaos_config::ChaosConfiguration;
use crate::document::BuiltinDocument;
use crate::error::ExperimentError;
use crate::parameters::DocumentParameters;

pub const DOCUMENT_NAME: &str = "HandlerReplacement-FIS-Automation-Doc";

/// Parameter Store actions on the chaos configuration parameters.
pub const PARAMETER_ACTIONS: [&str; 6] = [
    "ssm:PutParameter",
    "ssm:LabelParameterVersion",
    "ssm:DescribeDocumentParameters",
    "ssm:GetParameters",
    "ssm:GetParameter",
    "ssm:DescribeParameters",
];

pub const LAMBDA_ACTIONS: [&str; 3] = [
    "lambda:UpdateFunctionConfiguration",
    "lambda:GetFunctionConfiguration",
    "lambda:GetFunction",
];

/// `/ChaosInjection/ChaosConfigSsmParameter` → `/ChaosInjection/*`
pub fn parameter_prefix(parameter_name: &str) -> String {
    match parameter_name.rsplit_once('/') {
        Some((parent, _)) => format!("{}/*", parent),
        None => "*".to_string(),
    }
}

pub fn declare(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    target: &ExperimentTarget,
    layer_arn: &Token,
    config: &HandlerReplacementDemoConfig,
    options: &ExperimentOptions,
) -> Result<DeclaredExperiment, ExperimentError> {
    let chaos_payload = ChaosConfiguration::from(&config.chaos)
        .to_json()
        .map_err(chaos_core::SynthError::from)?;

    let scope = stack.scope(parent, id)?;
    let recipe = Recipe {
        document: BuiltinDocument::HandlerReplacement,
        document_name: DOCUMENT_NAME,
        automation_role_id: "ssma-put-parameterstore-role",
        automation_role_name: "ssmaHandlerReplacementRole",
        template_id: "fis-template-replace_handler",
        description: "Inject faults into Lambda function using chaos-lambda and handler replacement library",
        action_description: "Update SSM parameters and replace handler with Chaos Lambda Layer to inject chaos into Lambda function.",
        tag_name: "Lambda Handler Replacement",
    };

    let parameters_arn = arn::ssm_parameter(stack.context(), parameter_prefix(&config.parameter_name));
    let grants = vec![
        PolicyStatement::allow(PARAMETER_ACTIONS, [parameters_arn])?,
        PolicyStatement::allow(LAMBDA_ACTIONS, [&target.function.arn])?,
        PolicyStatement::allow(["lambda:GetLayerVersion"], [layer_arn])?,
    ];

    declare_recipe(
        stack,
        scope,
        &recipe,
        target,
        &config.settings,
        options,
        grants,
        |role| {
            DocumentParameters::new()
                .with("FunctionName", &target.function.name)
                .with("ChaosLayerArn", layer_arn)
                .with("DurationMinutes", config.settings.duration.as_str())
                .with("AutomationAssumeRole", role.arn())
                .with("ChaosParameterName", config.parameter_name.as_str())
                .with("ChaosParameterValue", chaos_payload)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_prefix() {
        assert_eq!(
            parameter_prefix("/ChaosInjection/ChaosConfigSsmParameter"),
            "/ChaosInjection/*"
        );
        assert_eq!(parameter_prefix("/flat"), "/*");
        assert_eq!(parameter_prefix("flat"), "*");
    }
}
