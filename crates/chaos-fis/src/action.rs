//! FIS experiment actions.

use chaos_core::Token;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::parameters::DocumentParameters;

/// Actions FIS can run that the experiments use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    /// Start an SSM Automation execution and stop it when the experiment
    /// ends.
    StartAutomationExecution,
    /// Pause for a fixed duration.
    Wait,
}

impl ActionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::StartAutomationExecution => "aws:ssm:start-automation-execution",
            ActionId::Wait => "aws:fis:wait",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One action of an experiment template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExperimentAction {
    action_id: ActionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Token>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    start_after: Vec<String>,
}

impl ExperimentAction {
    pub fn new(action_id: ActionId) -> Self {
        Self {
            action_id,
            description: None,
            parameters: BTreeMap::new(),
            start_after: Vec::new(),
        }
    }

    /// Run an automation document. `document_arn` is the document itself
    /// (not the automation definition); `max_duration` bounds the execution.
    pub fn start_automation(
        document_arn: impl Into<Token>,
        parameters: &DocumentParameters,
        max_duration: &str,
    ) -> Self {
        Self::new(ActionId::StartAutomationExecution)
            .parameter("documentArn", document_arn)
            .parameter("documentParameters", parameters.to_json())
            .parameter("maxDuration", max_duration)
    }

    pub fn wait(duration: &str) -> Self {
        Self::new(ActionId::Wait).parameter("duration", duration)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Token>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Run after the named actions completed.
    pub fn start_after(mut self, action: impl Into<String>) -> Self {
        self.start_after.push(action.into());
        self
    }

    pub fn action_id(&self) -> ActionId {
        self.action_id
    }

    pub fn get_parameter(&self, name: &str) -> Option<&Token> {
        self.parameters.get(name)
    }
}
