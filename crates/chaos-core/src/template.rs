//! CloudFormation template model.
//!
//! Resources are typed at the edges (each construct knows its own property
//! shape) and stored here as JSON property maps. Raw overrides recorded on a
//! resource are merged last, after the regular properties are rendered, so
//! any field the high-level builders do not expose can still be patched.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::construct::LogicalId;
use crate::error::SynthError;
use crate::token::Token;

/// Metadata key recording the construct path of each resource.
pub const PATH_METADATA_KEY: &str = "chaos:path";

/// What happens to a resource when it leaves the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// One raw escape-hatch patch.
#[derive(Debug, Clone, PartialEq)]
struct RawOverride {
    path: String,
    /// `None` deletes the value at `path`.
    value: Option<Value>,
}

/// A resource as it will appear under `Resources`.
#[derive(Debug, Clone, PartialEq)]
pub struct CfnResource {
    resource_type: String,
    properties: Map<String, Value>,
    depends_on: BTreeSet<LogicalId>,
    metadata: Map<String, Value>,
    removal_policy: Option<RemovalPolicy>,
    overrides: Vec<RawOverride>,
}

impl CfnResource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: BTreeSet::new(),
            metadata: Map::new(),
            removal_policy: None,
            overrides: Vec::new(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Set a property. Serialization of plain data types cannot fail, but a
    /// failing `Serialize` impl is reported rather than swallowed.
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<(), SynthError> {
        self.properties
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Builder form of [`CfnResource::set_property`].
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, SynthError> {
        self.set_property(name, value)?;
        Ok(self)
    }

    /// Set a property only when a value is present.
    pub fn with_optional_property<T: Serialize>(
        self,
        name: impl Into<String>,
        value: Option<T>,
    ) -> Result<Self, SynthError> {
        match value {
            Some(v) => self.with_property(name, v),
            None => Ok(self),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn add_dependency(&mut self, target: &LogicalId) {
        self.depends_on.insert(target.clone());
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn set_removal_policy(&mut self, policy: RemovalPolicy) {
        self.removal_policy = Some(policy);
    }

    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.set_removal_policy(policy);
        self
    }

    /// Record a raw override of the rendered resource.
    ///
    /// The path is dot-separated and rooted at the resource, e.g.
    /// `Properties.AssumeRolePolicyDocument.Statement.0.Principal.Service`.
    /// A numeric segment indexes into an existing array.
    pub fn add_override(&mut self, path: impl Into<String>, value: Value) {
        self.overrides.push(RawOverride {
            path: path.into(),
            value: Some(value),
        });
    }

    /// Shorthand for an override under `Properties.`.
    pub fn add_property_override(&mut self, path: &str, value: Value) {
        self.add_override(format!("Properties.{}", path), value);
    }

    /// Record the removal of a rendered value.
    pub fn add_deletion_override(&mut self, path: impl Into<String>) {
        self.overrides.push(RawOverride {
            path: path.into(),
            value: None,
        });
    }

    /// Render to the JSON object placed under `Resources`.
    pub fn render(&self) -> Result<Value, SynthError> {
        let mut out = Map::new();
        out.insert("Type".into(), Value::String(self.resource_type.clone()));
        if !self.properties.is_empty() {
            out.insert("Properties".into(), Value::Object(self.properties.clone()));
        }
        if !self.depends_on.is_empty() {
            out.insert("DependsOn".into(), serde_json::to_value(&self.depends_on)?);
        }
        if let Some(policy) = self.removal_policy {
            let policy = serde_json::to_value(policy)?;
            out.insert("UpdateReplacePolicy".into(), policy.clone());
            out.insert("DeletionPolicy".into(), policy);
        }
        if !self.metadata.is_empty() {
            out.insert("Metadata".into(), Value::Object(self.metadata.clone()));
        }

        let mut rendered = Value::Object(out);
        for raw in &self.overrides {
            apply_override(&mut rendered, &raw.path, raw.value.clone())?;
        }
        Ok(rendered)
    }
}

/// Apply one dot-path patch to a JSON tree.
fn apply_override(root: &mut Value, path: &str, value: Option<Value>) -> Result<(), SynthError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SynthError::InvalidOverride {
            path: path.to_string(),
            reason: "empty path segment".into(),
        });
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| SynthError::InvalidOverride {
            path: path.to_string(),
            reason: "empty path".into(),
        })?;

    let mut current = root;
    for segment in parents {
        current = descend(current, segment, value.is_some()).ok_or_else(|| {
            SynthError::InvalidOverride {
                path: path.to_string(),
                reason: format!("'{}' does not lead to an object or array", segment),
            }
        })?;
    }

    match (current, value) {
        (Value::Array(items), value) if last.parse::<usize>().is_ok() => {
            let idx: usize = last.parse().unwrap_or(usize::MAX);
            match value {
                Some(v) if idx < items.len() => items[idx] = v,
                Some(v) if idx == items.len() => items.push(v),
                None if idx < items.len() => {
                    items.remove(idx);
                }
                None => {}
                Some(_) => {
                    return Err(SynthError::InvalidOverride {
                        path: path.to_string(),
                        reason: format!("index {} out of bounds", idx),
                    });
                }
            }
        }
        (Value::Object(map), Some(v)) => {
            map.insert((*last).to_string(), v);
        }
        (Value::Object(map), None) => {
            map.remove(*last);
        }
        (_, None) => {}
        (_, Some(_)) => {
            return Err(SynthError::InvalidOverride {
                path: path.to_string(),
                reason: format!("cannot set '{}' on a scalar", last),
            });
        }
    }
    Ok(())
}

/// Step into `segment`, creating intermediate objects when `create` is set.
fn descend<'a>(current: &'a mut Value, segment: &str, create: bool) -> Option<&'a mut Value> {
    match current {
        Value::Array(items) => {
            let idx: usize = segment.parse().ok()?;
            items.get_mut(idx)
        }
        Value::Object(map) => {
            if create {
                let entry = map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                (entry.is_object() || entry.is_array()).then_some(entry)
            } else {
                map.get_mut(segment)
            }
        }
        _ => None,
    }
}

/// A stack output.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub value: Token,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(value: impl Into<Token>) -> Self {
        Self {
            value: value.into(),
            description: None,
            export_name: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn export_name(mut self, name: impl Into<String>) -> Self {
        self.export_name = Some(name.into());
        self
    }

    fn render(&self) -> Result<Value, SynthError> {
        let mut out = Map::new();
        if let Some(description) = &self.description {
            out.insert("Description".into(), Value::String(description.clone()));
        }
        out.insert("Value".into(), serde_json::to_value(&self.value)?);
        if let Some(name) = &self.export_name {
            out.insert("Export".into(), serde_json::json!({ "Name": name }));
        }
        Ok(Value::Object(out))
    }
}

/// The full template of one stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    description: Option<String>,
    resources: BTreeMap<LogicalId, CfnResource>,
    outputs: BTreeMap<LogicalId, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Insert a resource, rejecting logical id collisions.
    pub fn insert_resource(
        &mut self,
        logical_id: LogicalId,
        resource: CfnResource,
        path: &str,
    ) -> Result<(), SynthError> {
        if self.resources.contains_key(&logical_id) || self.outputs.contains_key(&logical_id) {
            return Err(SynthError::DuplicateLogicalId {
                logical_id: logical_id.to_string(),
                path: path.to_string(),
            });
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Insert an output, rejecting logical id collisions.
    pub fn insert_output(
        &mut self,
        logical_id: LogicalId,
        output: Output,
        path: &str,
    ) -> Result<(), SynthError> {
        if self.resources.contains_key(&logical_id) || self.outputs.contains_key(&logical_id) {
            return Err(SynthError::DuplicateLogicalId {
                logical_id: logical_id.to_string(),
                path: path.to_string(),
            });
        }
        self.outputs.insert(logical_id, output);
        Ok(())
    }

    pub fn resource(&self, logical_id: &LogicalId) -> Option<&CfnResource> {
        self.resources.get(logical_id)
    }

    pub fn resource_mut(&mut self, logical_id: &LogicalId) -> Option<&mut CfnResource> {
        self.resources.get_mut(logical_id)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &CfnResource)> {
        self.resources.iter()
    }

    /// Resources of one CloudFormation type.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a LogicalId, &'a CfnResource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&LogicalId, &Output)> {
        self.outputs.iter()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Render the complete template JSON.
    pub fn render(&self) -> Result<Value, SynthError> {
        let mut out = Map::new();
        if let Some(description) = &self.description {
            out.insert("Description".into(), Value::String(description.clone()));
        }

        let mut resources = Map::new();
        for (id, resource) in &self.resources {
            resources.insert(id.to_string(), resource.render()?);
        }
        out.insert("Resources".into(), Value::Object(resources));

        if !self.outputs.is_empty() {
            let mut outputs = Map::new();
            for (id, output) in &self.outputs {
                outputs.insert(id.to_string(), output.render()?);
            }
            out.insert("Outputs".into(), Value::Object(outputs));
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn role_resource() -> CfnResource {
        CfnResource::new("AWS::IAM::Role")
            .with_property(
                "AssumeRolePolicyDocument",
                json!({
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": ["iam.amazonaws.com", "ssm.amazonaws.com"] }
                    }]
                }),
            )
            .unwrap()
    }

    #[test]
    fn test_render_basic_resource() {
        let mut resource = CfnResource::new("AWS::Logs::LogGroup")
            .with_property("LogGroupName", "/aws/fis/experiment/demo1")
            .unwrap()
            .with_property("RetentionInDays", 7)
            .unwrap()
            .with_removal_policy(RemovalPolicy::Delete);
        resource.add_dependency(&LogicalId::new("Other"));

        assert_eq!(
            resource.render().unwrap(),
            json!({
                "Type": "AWS::Logs::LogGroup",
                "Properties": {
                    "LogGroupName": "/aws/fis/experiment/demo1",
                    "RetentionInDays": 7
                },
                "DependsOn": ["Other"],
                "UpdateReplacePolicy": "Delete",
                "DeletionPolicy": "Delete"
            })
        );
    }

    #[test]
    fn test_override_indexes_into_arrays() {
        let mut resource = role_resource();
        resource.add_override(
            "Properties.AssumeRolePolicyDocument.Statement.0.Principal.Service",
            json!(["ssm.amazonaws.com", "iam.amazonaws.com"]),
        );
        let rendered = resource.render().unwrap();
        assert_eq!(
            rendered["Properties"]["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]
                ["Service"],
            json!(["ssm.amazonaws.com", "iam.amazonaws.com"])
        );
    }

    #[test]
    fn test_override_creates_missing_objects_and_deletes() {
        let mut resource = role_resource();
        resource.add_property_override("Tags.0", json!("ignored"));
        resource.add_property_override("MaxSessionDuration", json!(3600));
        resource.add_override("Metadata.Owner", json!("chaos"));
        resource.add_deletion_override("Properties.MaxSessionDuration");

        let rendered = resource.render().unwrap();
        assert_eq!(rendered["Metadata"]["Owner"], json!("chaos"));
        assert!(rendered["Properties"].get("MaxSessionDuration").is_none());
        assert_eq!(rendered["Properties"]["Tags"], json!({ "0": "ignored" }));
    }

    #[test]
    fn test_override_on_scalar_fails() {
        let mut resource = CfnResource::new("AWS::SSM::Parameter")
            .with_property("Name", "x")
            .unwrap();
        resource.add_override("Properties.Name.Inner", json!(1));
        assert!(matches!(
            resource.render(),
            Err(SynthError::InvalidOverride { .. })
        ));
    }

    #[test]
    fn test_template_rejects_duplicate_logical_ids() {
        let mut template = Template::new();
        let id = LogicalId::new("Role");
        template
            .insert_resource(id.clone(), role_resource(), "S/Role")
            .unwrap();
        let err = template
            .insert_output(id, Output::new("x"), "S/Role")
            .unwrap_err();
        assert!(matches!(err, SynthError::DuplicateLogicalId { .. }));
    }

    #[test]
    fn test_render_outputs() {
        let mut template = Template::new();
        template.set_description("demo");
        template
            .insert_output(
                LogicalId::new("FunctionName"),
                Output::new("demo-Func").export_name("demo-fn"),
                "S/FunctionName",
            )
            .unwrap();
        assert_eq!(
            template.render().unwrap(),
            json!({
                "Description": "demo",
                "Resources": {},
                "Outputs": {
                    "FunctionName": { "Value": "demo-Func", "Export": { "Name": "demo-fn" } }
                }
            })
        );
    }
}
