//! App: the set of stacks synthesized together.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::SynthError;
use crate::stack::Stack;

/// File name of the manifest written next to the templates.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Version tag of the manifest format.
const MANIFEST_VERSION: &str = "1.0";

/// Index of a synthesized output directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub version: String,
    pub artifacts: BTreeMap<String, ManifestArtifact>,
}

/// One stack in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestArtifact {
    pub template_file: String,
    pub environment: String,
    pub resource_count: usize,
}

/// Ordered collection of stacks with unique names.
#[derive(Debug, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stack(&mut self, stack: Stack) -> Result<(), SynthError> {
        if self.stack(stack.name()).is_some() {
            return Err(SynthError::DuplicateStack(stack.name().to_string()));
        }
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// Resolve a selection of stack names; an empty selection means all.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Stack>, SynthError> {
        if names.is_empty() {
            return Ok(self.stacks.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.stack(name)
                    .ok_or_else(|| SynthError::UnknownStack(name.clone()))
            })
            .collect()
    }

    /// Write `<stack>.template.json` for each selected stack plus the
    /// manifest into `out_dir`.
    ///
    /// Every template is rendered before anything is written, so a failing
    /// stack leaves no output behind.
    pub fn synth(&self, out_dir: &Path, names: &[String]) -> Result<Manifest, SynthError> {
        let selected = self.select(names)?;

        let mut rendered: Vec<(&Stack, Value)> = Vec::with_capacity(selected.len());
        for stack in selected {
            rendered.push((stack, stack.to_template_json()?));
        }

        fs::create_dir_all(out_dir).map_err(|source| SynthError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut artifacts = BTreeMap::new();
        for (stack, template) in rendered {
            let file_name = template_file_name(stack.name());
            write_json(&out_dir.join(&file_name), &template)?;
            tracing::info!(
                stack = %stack.name(),
                resources = stack.template().resource_count(),
                file = %file_name,
                "synthesized stack"
            );
            artifacts.insert(
                stack.name().to_string(),
                ManifestArtifact {
                    template_file: file_name,
                    environment: stack.context().environment().to_string(),
                    resource_count: stack.template().resource_count(),
                },
            );
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            artifacts,
        };
        write_json(&out_dir.join(MANIFEST_FILE), &manifest)?;
        Ok(manifest)
    }
}

/// `ServerlessChaos-Demo-1` → `ServerlessChaos-Demo-1.template.json`
pub fn template_file_name(stack_name: &str) -> String {
    format!("{}.template.json", stack_name)
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), SynthError> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body).map_err(|source| SynthError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Environment;
    use crate::template::CfnResource;
    use pretty_assertions::assert_eq;

    fn stack(name: &str) -> Stack {
        let mut stack = Stack::new(name, Environment::agnostic()).unwrap();
        let root = stack.root();
        stack
            .add_resource(root, "Param", CfnResource::new("AWS::SSM::Parameter"))
            .unwrap();
        stack
    }

    #[test]
    fn test_duplicate_stack_rejected() {
        let mut app = App::new();
        app.add_stack(stack("A")).unwrap();
        assert!(matches!(
            app.add_stack(stack("A")),
            Err(SynthError::DuplicateStack(name)) if name == "A"
        ));
    }

    #[test]
    fn test_synth_writes_templates_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new();
        app.add_stack(stack("A")).unwrap();
        app.add_stack(stack("B")).unwrap();

        let manifest = app.synth(dir.path(), &[]).unwrap();
        assert_eq!(
            manifest.artifacts.keys().cloned().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );

        let written: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("A.template.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written["Resources"]["Param"]["Type"], "AWS::SSM::Parameter");

        let manifest_json: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(
            manifest_json["artifacts"]["B"]["templateFile"],
            "B.template.json"
        );
        assert_eq!(
            manifest_json["artifacts"]["B"]["environment"],
            "aws://unknown-account/unknown-region"
        );
    }

    #[test]
    fn test_synth_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new();
        app.add_stack(stack("A")).unwrap();
        app.add_stack(stack("B")).unwrap();

        app.synth(dir.path(), &["B".to_string()]).unwrap();
        assert!(!dir.path().join("A.template.json").exists());
        assert!(dir.path().join("B.template.json").exists());

        let err = app.synth(dir.path(), &["C".to_string()]).unwrap_err();
        assert!(matches!(err, SynthError::UnknownStack(_)));
    }

    #[test]
    fn test_failing_stack_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut bad = stack("Bad");
        let id = crate::construct::LogicalId::new("Param");
        bad.resource_mut(&id)
            .unwrap()
            .add_override("Type.Nested", serde_json::json!(1));

        let mut app = App::new();
        app.add_stack(stack("Good")).unwrap();
        app.add_stack(bad).unwrap();

        assert!(app.synth(&out, &[]).is_err());
        assert!(!out.exists());
    }
}
