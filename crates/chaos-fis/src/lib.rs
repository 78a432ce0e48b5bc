//! Fault Injection Simulator experiments driven by SSM Automation.
//!
//! An experiment template holds one `aws:ssm:start-automation-execution`
//! action. FIS assumes the experiment role to start the automation, and
//! SSM assumes the automation role to apply the fault to the target
//! function. The [`experiments`] module contains the three stock recipes.

pub mod action;
pub mod chaos_config;
pub mod document;
pub mod error;
pub mod experiment;
pub mod experiments;
pub mod parameters;
pub mod role;

pub use action::{ActionId, ExperimentAction};
pub use chaos_config::ChaosConfiguration;
pub use document::{
    AutomationContent, AutomationDocument, BuiltinDocument, DEFAULT_DOCUMENT_VERSION,
    DOCUMENT_TYPE,
};
pub use error::{DocumentError, ExperimentError};
pub use experiment::{
    EXPERIMENT_TEMPLATE_TYPE, Experiment, ExperimentDescriptor, ExperimentTemplate,
    LOG_SCHEMA_VERSION, LogDestination, StopCondition,
};
pub use experiments::{
    AUTOMATION_ACTION_NAME, DeclaredExperiment, ExperimentNaming, ExperimentOptions,
    ExperimentTarget,
};
pub use parameters::{DocumentParameters, ParameterValue};
pub use role::{AUTOMATION_LOGGING_ACTIONS, automation_role, fis_role};
