//! SSM Automation documents.
//!
//! The three stock documents are embedded in the binary. A documents
//! directory given in the configuration may replace any of them with a file
//! of the same name. Documents are parsed once; only their top-level
//! metadata is inspected and the whole tree is embedded as the `Content` of
//! an `AWS::SSM::Document`.

use chaos_core::{CfnResource, LogicalId, NodeId, Stack, SynthError, Token, arn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::DocumentError;

pub const DOCUMENT_TYPE: &str = "AWS::SSM::Document";

/// Version selector used when starting an automation.
pub const DEFAULT_DOCUMENT_VERSION: &str = "$DEFAULT";

const AUTOMATION_SCHEMA_VERSION: &str = "0.3";

/// Documents shipped with the experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinDocument {
    PutConcurrency,
    HandlerReplacement,
    ChaosExtension,
}

impl BuiltinDocument {
    pub const ALL: [BuiltinDocument; 3] = [
        BuiltinDocument::PutConcurrency,
        BuiltinDocument::HandlerReplacement,
        BuiltinDocument::ChaosExtension,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            BuiltinDocument::PutConcurrency => "ssm-document-put-concurrency.yml",
            BuiltinDocument::HandlerReplacement => "ssm-document-handler-replacement.yml",
            BuiltinDocument::ChaosExtension => "ssm-document-configure-chaos-extension.yml",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            BuiltinDocument::PutConcurrency => {
                include_str!("../documents/ssm-document-put-concurrency.yml")
            }
            BuiltinDocument::HandlerReplacement => {
                include_str!("../documents/ssm-document-handler-replacement.yml")
            }
            BuiltinDocument::ChaosExtension => {
                include_str!("../documents/ssm-document-configure-chaos-extension.yml")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentHeader {
    #[serde(rename = "schemaVersion")]
    schema_version: Option<String>,
    description: Option<String>,
    #[serde(rename = "assumeRole")]
    assume_role: Option<String>,
    #[serde(default)]
    parameters: serde_yaml::Mapping,
    #[serde(rename = "mainSteps", default)]
    main_steps: Vec<serde_yaml::Value>,
}

/// A parsed automation document.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationContent {
    content: serde_json::Value,
    description: Option<String>,
    assume_role: Option<String>,
    parameter_names: Vec<String>,
}

impl AutomationContent {
    /// Parse document YAML. `name` only labels errors.
    pub fn parse(name: &str, yaml: &str) -> Result<Self, DocumentError> {
        let parse_error = |source| DocumentError::Parse {
            name: name.to_string(),
            source,
        };
        let invalid = |reason: String| DocumentError::Invalid {
            name: name.to_string(),
            reason,
        };

        let tree: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(parse_error)?;
        if !tree.is_mapping() {
            return Err(invalid("top level is not a mapping".into()));
        }
        let header: DocumentHeader =
            serde_yaml::from_value(tree.clone()).map_err(parse_error)?;

        match header.schema_version.as_deref() {
            Some(AUTOMATION_SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(invalid(format!(
                    "schemaVersion '{}' is not an Automation schema (expected '{}')",
                    other, AUTOMATION_SCHEMA_VERSION
                )));
            }
            None => return Err(invalid("missing schemaVersion".into())),
        }
        if header.main_steps.is_empty() {
            return Err(invalid("mainSteps is empty".into()));
        }

        let mut parameter_names = Vec::with_capacity(header.parameters.len());
        for key in header.parameters.keys() {
            let Some(key) = key.as_str() else {
                return Err(invalid("parameter names must be strings".into()));
            };
            parameter_names.push(key.to_string());
        }

        let content =
            serde_json::to_value(&tree).map_err(|e| invalid(format!("not JSON-compatible: {}", e)))?;

        Ok(Self {
            content,
            description: header.description,
            assume_role: header.assume_role,
            parameter_names,
        })
    }

    /// Read and parse a document file.
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let yaml = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &yaml)
    }

    /// Load a stock document, preferring a same-named file in `documents_dir`.
    pub fn load(
        document: BuiltinDocument,
        documents_dir: Option<&Path>,
    ) -> Result<Self, DocumentError> {
        if let Some(dir) = documents_dir {
            let path = dir.join(document.file_name());
            if path.is_file() {
                tracing::info!(path = %path.display(), "using automation document override");
                return Self::from_file(&path);
            }
        }
        tracing::debug!(document = document.file_name(), "using embedded automation document");
        Self::parse(document.file_name(), document.source())
    }

    /// The whole document as JSON.
    pub fn content(&self) -> &serde_json::Value {
        &self.content
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The `assumeRole` expression, e.g. `{{ AutomationAssumeRole }}`.
    pub fn assume_role(&self) -> Option<&str> {
        self.assume_role.as_deref()
    }

    /// Parameter names in declaration order.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter_names.iter().any(|p| p == name)
    }
}

/// An automation document declared in a stack.
#[derive(Debug, Clone)]
pub struct AutomationDocument {
    logical_id: LogicalId,
    name: String,
    arn: Token,
    execution_arn: Token,
}

impl AutomationDocument {
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        name: &str,
        content: &AutomationContent,
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let resource = CfnResource::new(DOCUMENT_TYPE)
            .with_property("Content", content.content())?
            .with_property("DocumentFormat", "YAML")?
            .with_property("DocumentType", "Automation")?
            .with_property("Name", name)?;
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        tracing::debug!(
            document = name,
            parameters = content.parameter_names().len(),
            "declared automation document"
        );

        let ctx = stack.context();
        Ok(Self {
            arn: arn::ssm_document(ctx, name),
            execution_arn: arn::ssm_automation_definition(ctx, name, DEFAULT_DOCUMENT_VERSION),
            name: name.to_string(),
            logical_id,
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `arn:…:ssm:<region>:<account>:document/<name>`
    pub fn arn(&self) -> &Token {
        &self.arn
    }

    /// The automation definition started by experiments, pinned to the
    /// default version.
    pub fn automation_definition_arn(&self) -> &Token {
        &self.execution_arn
    }
}
