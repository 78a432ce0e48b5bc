//! Throttle a function by setting its reserved concurrency.

use chaos_core::config::ConcurrencyDemoConfig;
use chaos_core::{NodeId, Stack};
use chaos_policy::PolicyStatement;

use super::{DeclaredExperiment, ExperimentOptions, ExperimentTarget, Recipe, declare_recipe};
use crate::document::BuiltinDocument;
use crate::error::ExperimentError;
use crate::parameters::DocumentParameters;

pub const DOCUMENT_NAME: &str = "LambdaConcurrency-FIS-Automation-Doc";

/// The only Lambda actions the automation role is granted.
pub const LAMBDA_ACTIONS: [&str; 2] = [
    "lambda:PutFunctionConcurrency",
    "lambda:DeleteFunctionConcurrency",
];

pub fn declare(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    target: &ExperimentTarget,
    config: &ConcurrencyDemoConfig,
    options: &ExperimentOptions,
) -> Result<DeclaredExperiment, ExperimentError> {
    let scope = stack.scope(parent, id)?;
    let recipe = Recipe {
        document: BuiltinDocument::PutConcurrency,
        document_name: DOCUMENT_NAME,
        automation_role_id: "ssma-put-concurrency-role",
        automation_role_name: "ssmaPutConcurrencyRole",
        template_id: "fis-template-lambda-concurrency",
        description: "Sets the concurrency level on a Lambda function.",
        action_description: "Update SSM parameter used to inject chaos into Lambda function.",
        tag_name: "Set Lambda concurrency level",
    };
    let grants = vec![PolicyStatement::allow(LAMBDA_ACTIONS, [&target.function.arn])?];

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
                .with("DurationMinutes", config.settings.duration.as_str())
                .with("AutomationAssumeRole", role.arn())
                .with("FunctionName", &target.function.name)
                .with("ConcurrencyLevel", config.concurrency_level)
        },
    )
}
