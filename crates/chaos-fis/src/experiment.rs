//! FIS experiment templates.
//!
//! [`ExperimentTemplate`] collects the pieces of an experiment (the role FIS
//! assumes, the actions, stop conditions and a log destination) and
//! assembles them into an [`ExperimentDescriptor`], the properties of an
//! `AWS::FIS::ExperimentTemplate`. Assembly never fails: nothing is checked
//! against the automation document, and an alarm ARN is taken as given,
//! even when empty.

use chaos_core::{CfnResource, LogicalId, NodeId, Stack, SynthError, Token};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::action::ExperimentAction;

pub const EXPERIMENT_TEMPLATE_TYPE: &str = "AWS::FIS::ExperimentTemplate";

/// Log schema version written by FIS.
pub const LOG_SCHEMA_VERSION: u32 = 2;

const CLOUDWATCH_ALARM_SOURCE: &str = "aws:cloudwatch:alarm";
const NO_STOP_CONDITION_SOURCE: &str = "none";

/// Condition that halts a running experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopCondition {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Token>,
}

impl StopCondition {
    /// Stop when the alarm enters the ALARM state.
    pub fn alarm(alarm_arn: impl Into<Token>) -> Self {
        Self {
            source: CLOUDWATCH_ALARM_SOURCE.to_string(),
            value: Some(alarm_arn.into()),
        }
    }

    /// Run to completion.
    pub fn none() -> Self {
        Self {
            source: NO_STOP_CONDITION_SOURCE.to_string(),
            value: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn value(&self) -> Option<&Token> {
        self.value.as_ref()
    }
}

/// Where FIS writes experiment logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    CloudWatchLogs { log_group_arn: Token },
    S3 { bucket: Token, prefix: Option<String> },
}

impl Serialize for LogDestination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            LogDestination::CloudWatchLogs { log_group_arn } => {
                let mut inner = BTreeMap::new();
                inner.insert("LogGroupArn", log_group_arn);
                map.serialize_entry("CloudWatchLogsConfiguration", &inner)?;
            }
            LogDestination::S3 { bucket, prefix } => {
                let mut inner = BTreeMap::new();
                inner.insert("BucketName", bucket.clone());
                if let Some(prefix) = prefix {
                    inner.insert("Prefix", Token::literal(prefix));
                }
                map.serialize_entry("S3Configuration", &inner)?;
            }
        }
        map.serialize_entry("LogSchemaVersion", &LOG_SCHEMA_VERSION)?;
        map.end()
    }
}

/// Properties of an `AWS::FIS::ExperimentTemplate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExperimentDescriptor {
    actions: BTreeMap<String, ExperimentAction>,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_configuration: Option<LogDestination>,
    role_arn: Token,
    stop_conditions: Vec<StopCondition>,
    tags: BTreeMap<String, String>,
    targets: BTreeMap<String, serde_json::Value>,
}

impl ExperimentDescriptor {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role_arn(&self) -> &Token {
        &self.role_arn
    }

    pub fn action(&self, name: &str) -> Option<&ExperimentAction> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ExperimentAction)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn stop_conditions(&self) -> &[StopCondition] {
        &self.stop_conditions
    }

    pub fn log_configuration(&self) -> Option<&LogDestination> {
        self.log_configuration.as_ref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

/// Builder for an [`ExperimentDescriptor`].
#[derive(Debug, Clone)]
pub struct ExperimentTemplate {
    descriptor: ExperimentDescriptor,
}

impl ExperimentTemplate {
    /// `role_arn` is the role FIS assumes to run the actions.
    pub fn new(description: impl Into<String>, role_arn: impl Into<Token>) -> Self {
        Self {
            descriptor: ExperimentDescriptor {
                actions: BTreeMap::new(),
                description: description.into(),
                log_configuration: None,
                role_arn: role_arn.into(),
                stop_conditions: Vec::new(),
                tags: BTreeMap::new(),
                targets: BTreeMap::new(),
            },
        }
    }

    /// Add an action under `name`, replacing one of the same name.
    pub fn action(mut self, name: impl Into<String>, action: ExperimentAction) -> Self {
        self.descriptor.actions.insert(name.into(), action);
        self
    }

    pub fn stop_condition(mut self, condition: StopCondition) -> Self {
        self.descriptor.stop_conditions.push(condition);
        self
    }

    pub fn log_to(mut self, destination: LogDestination) -> Self {
        self.descriptor.log_configuration = Some(destination);
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.tags.insert(key.into(), value.into());
        self
    }

    pub fn assemble(self) -> ExperimentDescriptor {
        self.descriptor
    }
}

/// A declared experiment template.
#[derive(Debug, Clone)]
pub struct Experiment {
    logical_id: LogicalId,
    descriptor: ExperimentDescriptor,
}

impl Experiment {
    /// Declare the template. `depends_on` lists resources the template
    /// references by name only, such as the automation document.
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        descriptor: ExperimentDescriptor,
        depends_on: &[&LogicalId],
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let properties = serde_json::to_value(&descriptor)?;

        let mut resource = CfnResource::new(EXPERIMENT_TEMPLATE_TYPE);
        if let serde_json::Value::Object(map) = properties {
            for (name, value) in map {
                resource.set_property(name, value)?;
            }
        }
        for dependency in depends_on {
            resource.add_dependency(dependency);
        }
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        tracing::info!(
            stack = stack.name(),
            experiment = %logical_id,
            actions = descriptor.actions.len(),
            "declared experiment template"
        );

        Ok(Self {
            logical_id,
            descriptor,
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// Experiment template id (`Ref`).
    pub fn template_id(&self) -> Token {
        Token::reference(&self.logical_id)
    }

    pub fn descriptor(&self) -> &ExperimentDescriptor {
        &self.descriptor
    }
}
