//! Inject latency or replace responses through the chaos Lambda extension,
//! which proxies the Runtime API of the function it is attached to.

use chaos_core::config::ExtensionDemoConfig;
use chaos_core::{NodeId, Stack, Token};
use chaos_policy::PolicyStatement;

use super::{DeclaredExperiment, ExperimentOptions, ExperimentTarget, Recipe, declare_recipe};
use crate::document::BuiltinDocument;
use crate::error::ExperimentError;
use crate::parameters::DocumentParameters;

pub const DOCUMENT_NAME: &str = "ChaosExtensionProxy-FIS-Automation-Doc";

pub const LAMBDA_ACTIONS: [&str; 2] = [
    "lambda:UpdateFunctionConfiguration",
    "lambda:GetFunctionConfiguration",
];

pub fn declare(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    target: &ExperimentTarget,
    layer_arn: &Token,
    config: &ExtensionDemoConfig,
    options: &ExperimentOptions,
) -> Result<DeclaredExperiment, ExperimentError> {
    let scope = stack.scope(parent, id)?;
    let recipe = Recipe {
        document: BuiltinDocument::ChaosExtension,
        document_name: DOCUMENT_NAME,
        automation_role_id: "ssma-ChaosExtensionProxy-role",
        automation_role_name: "ssmaChaosExtensionProxyRole",
        template_id: "fis-template-chaos-extension-proxy",
        description: "Inject faults into Lambda function using the extension proxy pattern.",
        action_description: "Add chaos extension layer and update environment variables to start the chaos experiment.",
        tag_name: "Chaos Extension Proxy Experiment",
    };
    let grants = vec![
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
                .with("ChaosType", config.chaos_type.as_str())
                .with("ChaosLatency", config.chaos_latency.as_str())
                .with("ChaosResponse", config.chaos_response.as_str())
                .with("ChaosProbability", config.chaos_probability.as_str())
                .with("DurationMinutes", config.settings.duration.as_str())
                .with("AutomationAssumeRole", role.arn())
        },
    )
}
