//! Stacks: one construct tree plus the template it renders to.

use serde_json::Value;

use crate::construct::{ConstructTree, LogicalId, NodeId};
use crate::context::{Environment, StackContext};
use crate::error::SynthError;
use crate::template::{CfnResource, Output, PATH_METADATA_KEY, Template};

/// Longest stack name CloudFormation accepts.
const MAX_STACK_NAME_LEN: usize = 128;

/// A deployable unit. Owns its scope hierarchy and its resources.
#[derive(Debug, Clone)]
pub struct Stack {
    ctx: StackContext,
    tree: ConstructTree,
    template: Template,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(name: impl Into<String>, environment: Environment) -> Result<Self, SynthError> {
        let name = name.into();
        validate_stack_name(&name)?;
        Ok(Self {
            ctx: StackContext::new(name.clone(), environment),
            tree: ConstructTree::new(name),
            template: Template::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.ctx.stack_name()
    }

    pub fn context(&self) -> &StackContext {
        &self.ctx
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    /// Open a child scope that groups related resources.
    pub fn scope(&mut self, parent: NodeId, id: &str) -> Result<NodeId, SynthError> {
        self.tree.add_child(parent, id)
    }

    /// Declare a resource under `parent` and return its logical id.
    pub fn add_resource(
        &mut self,
        parent: NodeId,
        id: &str,
        mut resource: CfnResource,
    ) -> Result<LogicalId, SynthError> {
        let node = self.tree.add_child(parent, id)?;
        let logical_id = self.tree.logical_id(node)?;
        let path = self.tree.path(node);
        resource.add_metadata(PATH_METADATA_KEY, Value::String(path.clone()));

        tracing::debug!(
            stack = %self.name(),
            logical_id = %logical_id,
            resource_type = %resource.resource_type(),
            "declared resource"
        );
        self.template
            .insert_resource(logical_id.clone(), resource, &path)?;
        Ok(logical_id)
    }

    /// Declare an output under `parent`.
    pub fn add_output(
        &mut self,
        parent: NodeId,
        id: &str,
        output: Output,
    ) -> Result<LogicalId, SynthError> {
        let node = self.tree.add_child(parent, id)?;
        let logical_id = self.tree.logical_id(node)?;
        let path = self.tree.path(node);
        self.template
            .insert_output(logical_id.clone(), output, &path)?;
        Ok(logical_id)
    }

    pub fn resource(&self, logical_id: &LogicalId) -> Result<&CfnResource, SynthError> {
        self.template
            .resource(logical_id)
            .ok_or_else(|| SynthError::UnknownResource(logical_id.to_string()))
    }

    /// Mutable access, used by the escape hatch and by `add_to_policy`.
    pub fn resource_mut(&mut self, logical_id: &LogicalId) -> Result<&mut CfnResource, SynthError> {
        self.template
            .resource_mut(logical_id)
            .ok_or_else(|| SynthError::UnknownResource(logical_id.to_string()))
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.template.set_description(description);
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Render the template JSON.
    pub fn to_template_json(&self) -> Result<Value, SynthError> {
        self.template.render()
    }
}

fn validate_stack_name(name: &str) -> Result<(), SynthError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !starts_with_letter || !rest_valid || name.len() > MAX_STACK_NAME_LEN {
        return Err(SynthError::InvalidStackName(name.to_string()));
    }
    Ok(())
}
