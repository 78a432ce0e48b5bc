//! End-to-end checks of the demo app: synthesis, schema validity and lint.

use chaos_cli::commands::{check, list, show, synth};
use chaos_cli::demos::{DEMO_ONE_STACK, DEMO_THREE_STACK, DEMO_TWO_STACK, build_app};
use chaos_core::app::template_file_name;
use chaos_core::{App, ChaosConfig, Environment, MANIFEST_FILE};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;

const TEMPLATE_SCHEMA: &str =
    include_str!("../../../schemas/CloudFormationTemplate.schema.json");

fn default_app() -> App {
    build_app(&ChaosConfig::default()).unwrap()
}

fn pinned_app() -> App {
    let mut config = ChaosConfig::default();
    config.environment = Environment::new(Some("111122223333".into()), Some("us-east-1".into()));
    build_app(&config).unwrap()
}

fn resources_of_type<'a>(template: &'a Value, resource_type: &str) -> Vec<&'a Value> {
    template["Resources"]
        .as_object()
        .unwrap()
        .values()
        .filter(|r| r["Type"] == resource_type)
        .collect()
}

#[test]
fn synth_writes_every_template_and_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chaos.out");

    let manifest = synth::run(&default_app(), &out, &[]).unwrap();

    let names: Vec<_> = manifest.artifacts.keys().map(String::as_str).collect();
    assert_eq!(names, [DEMO_ONE_STACK, DEMO_TWO_STACK, DEMO_THREE_STACK]);
    for name in &names {
        assert!(out.join(template_file_name(name)).is_file(), "{}", name);
    }

    let written: Value =
        serde_json::from_str(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(
        written["artifacts"][DEMO_ONE_STACK]["templateFile"],
        "ServerlessChaos-Demo-1.template.json"
    );
    assert_eq!(
        written["artifacts"][DEMO_ONE_STACK]["environment"],
        "aws://unknown-account/unknown-region"
    );
}

#[test]
fn synth_of_one_stack_writes_only_that_template() {
    let dir = tempfile::tempdir().unwrap();

    let manifest = synth::run(&default_app(), dir.path(), &[DEMO_TWO_STACK.to_string()]).unwrap();

    assert_eq!(manifest.artifacts.len(), 1);
    assert!(dir.path().join(template_file_name(DEMO_TWO_STACK)).is_file());
    assert!(!dir.path().join(template_file_name(DEMO_ONE_STACK)).exists());
}

#[test]
fn synth_of_an_unknown_stack_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let result = synth::run(&default_app(), &out, &["ServerlessChaos-Demo-9".to_string()]);

    assert!(result.is_err());
    assert!(!out.exists());
}

#[test]
fn synthesized_templates_match_the_template_schema() {
    let schema: Value = serde_json::from_str(TEMPLATE_SCHEMA).unwrap();
    let validator = jsonschema::validator_for(&schema).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for app in [default_app(), pinned_app()] {
        let manifest = synth::run(&app, dir.path(), &[]).unwrap();
        for artifact in manifest.artifacts.values() {
            let path = dir.path().join(&artifact.template_file);
            let template: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            let errors: Vec<String> = validator.iter_errors(&template).map(|e| e.to_string()).collect();
            assert!(errors.is_empty(), "{}: {:?}", artifact.template_file, errors);
        }
    }
}

#[test]
fn demo_stacks_pass_the_check() {
    for app in [default_app(), pinned_app()] {
        let report = check::check_stacks(&app, &[]).unwrap();
        assert!(!report.has_errors(), "{:?}", report);
        assert!(!report.has_warnings(), "{:?}", report);
    }
    check::run(&default_app(), &[], true).unwrap();
}

#[test]
fn check_rejects_unknown_stacks() {
    assert!(check::check_stacks(&default_app(), &["missing".to_string()]).is_err());
}

#[test]
fn list_reports_each_stack() {
    let lines = list::lines(&pinned_app());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with(DEMO_ONE_STACK));
    assert!(lines[0].contains("aws://111122223333/us-east-1"));
}

#[test]
fn show_renders_a_pinned_experiment() {
    let rendered = show::render(&pinned_app(), DEMO_ONE_STACK).unwrap();
    let template: Value = serde_json::from_str(&rendered).unwrap();

    let experiments = resources_of_type(&template, "AWS::FIS::ExperimentTemplate");
    assert_eq!(experiments.len(), 1);
    let action = &experiments[0]["Properties"]["Actions"]["ssmaAction"];
    assert_eq!(action["ActionId"], "aws:ssm:start-automation-execution");
    assert_eq!(
        action["Parameters"]["documentArn"],
        "arn:aws:ssm:us-east-1:111122223333:document/LambdaConcurrency-FIS-Automation-Doc"
    );

    assert_eq!(resources_of_type(&template, "AWS::Lambda::Function").len(), 1);
    assert_eq!(resources_of_type(&template, "AWS::CloudWatch::Alarm").len(), 1);
    assert_eq!(resources_of_type(&template, "AWS::Logs::LogGroup").len(), 1);
    assert_eq!(resources_of_type(&template, "AWS::SSM::Document").len(), 1);
    assert!(template["Outputs"]["FunctionName"].is_object());
}

#[test]
fn show_rejects_unknown_stacks() {
    let err = show::render(&default_app(), "nope").unwrap_err();
    assert!(err.to_string().contains(DEMO_ONE_STACK));
}

#[test]
fn demo_two_starts_with_chaos_disabled() {
    let template: Value =
        serde_json::from_str(&show::render(&default_app(), DEMO_TWO_STACK).unwrap()).unwrap();

    let parameters = resources_of_type(&template, "AWS::SSM::Parameter");
    assert_eq!(parameters.len(), 1);
    assert_eq!(
        parameters[0]["Properties"]["Name"],
        "/ChaosInjection/ChaosConfigSsmParameter"
    );
    let value: Value =
        serde_json::from_str(parameters[0]["Properties"]["Value"].as_str().unwrap()).unwrap();
    assert_eq!(value["is_enabled"], false);
}
