//! Experiment recipes.
//!
//! Every recipe declares the same five resources under its own scope: the
//! automation document, the automation role with the recipe's grants, the
//! FIS log group, the FIS role and the experiment template. Recipes differ
//! in the document, the grants and the document parameters.

pub mod concurrency;
pub mod extension_proxy;
pub mod handler_replacement;

use chaos_core::config::ExperimentSettings;
use chaos_core::{NodeId, ResourceIdentity, Stack, Token};
use chaos_policy::{PolicyStatement, Role};
use chaos_resources::{LogGroup, LogGroupProps};
use std::path::PathBuf;

use crate::action::ExperimentAction;
use crate::document::{AutomationContent, AutomationDocument, BuiltinDocument};
use crate::error::ExperimentError;
use crate::experiment::{Experiment, ExperimentTemplate, LogDestination, StopCondition};
use crate::parameters::DocumentParameters;
use crate::role::{automation_role, fis_role};

/// Name of the single action in every recipe.
pub const AUTOMATION_ACTION_NAME: &str = "ssmaAction";

/// What an experiment acts on and when it stops.
#[derive(Debug, Clone)]
pub struct ExperimentTarget {
    /// The function faults are injected into.
    pub function: ResourceIdentity,
    /// Alarm whose ALARM state stops the experiment.
    pub alarm_arn: Token,
}

/// Names that must be unique per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentNaming {
    pub log_group_id: String,
    pub log_group_name: String,
    pub fis_role_name: String,
}

impl ExperimentNaming {
    /// Names used by demo `n`.
    pub fn for_demo(n: u8) -> Self {
        Self {
            log_group_id: format!("fis-log-group-demo-{}", n),
            log_group_name: format!("/aws/fis/experiment/demo{}", n),
            fis_role_name: format!("fis-demo{}-role", n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentOptions {
    pub naming: ExperimentNaming,
    /// Directory with replacements for the embedded documents.
    pub documents_dir: Option<PathBuf>,
}

impl ExperimentOptions {
    pub fn for_demo(n: u8) -> Self {
        Self {
            naming: ExperimentNaming::for_demo(n),
            documents_dir: None,
        }
    }
}

/// Everything a recipe declared.
#[derive(Debug, Clone)]
pub struct DeclaredExperiment {
    pub document: AutomationDocument,
    pub automation_role: Role,
    pub log_group: LogGroup,
    pub fis_role: Role,
    pub experiment: Experiment,
}

/// The fixed parts of a recipe.
struct Recipe<'a> {
    document: BuiltinDocument,
    document_name: &'a str,
    automation_role_id: &'a str,
    automation_role_name: &'a str,
    template_id: &'a str,
    description: &'a str,
    action_description: &'a str,
    tag_name: &'a str,
}

#[allow(clippy::too_many_arguments)]
fn declare_recipe<F>(
    stack: &mut Stack,
    scope: NodeId,
    recipe: &Recipe<'_>,
    target: &ExperimentTarget,
    settings: &ExperimentSettings,
    options: &ExperimentOptions,
    grants: Vec<PolicyStatement>,
    parameters: F,
) -> Result<DeclaredExperiment, ExperimentError>
where
    F: FnOnce(&Role) -> DocumentParameters,
{
    let content = AutomationContent::load(recipe.document, options.documents_dir.as_deref())?;
    let document = AutomationDocument::declare(
        stack,
        scope,
        recipe.document_name,
        recipe.document_name,
        &content,
    )?;

    let automation_role = automation_role(
        stack,
        scope,
        recipe.automation_role_id,
        recipe.automation_role_name,
        grants,
    )?;

    let log_group = LogGroup::declare(
        stack,
        scope,
        &options.naming.log_group_id,
        LogGroupProps::experiment_logs(&options.naming.log_group_name),
    )?;

    let fis_role = fis_role(
        stack,
        scope,
        &options.naming.fis_role_name,
        &options.naming.fis_role_name,
        &document,
        &automation_role,
        &log_group,
    )?;

    let parameters = parameters(&automation_role);
    for name in parameters.names() {
        if !content.has_parameter(name) {
            tracing::warn!(
                document = recipe.document_name,
                parameter = name,
                "parameter is not declared by the automation document"
            );
        }
    }

    let action = ExperimentAction::start_automation(
        document.arn(),
        &parameters,
        &settings.max_duration,
    )
    .description(recipe.action_description);
    let descriptor = ExperimentTemplate::new(recipe.description, fis_role.arn())
        .action(AUTOMATION_ACTION_NAME, action)
        .stop_condition(StopCondition::alarm(&target.alarm_arn))
        .log_to(LogDestination::CloudWatchLogs {
            log_group_arn: log_group.arn().clone(),
        })
        .tag("Name", recipe.tag_name)
        .assemble();

    let experiment = Experiment::declare(
        stack,
        scope,
        recipe.template_id,
        descriptor,
        &[document.logical_id()],
    )?;

    Ok(DeclaredExperiment {
        document,
        automation_role,
        log_group,
        fis_role,
        experiment,
    })
}
