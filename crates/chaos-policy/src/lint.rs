//! Least-privilege lint over synthesized templates.
//!
//! The lint reads rendered template JSON, so it applies equally to
//! templates produced in-process and to files written by `synth`. It only
//! reports; nothing in synthesis depends on its outcome.

use serde_json::Value;
use std::fmt;

use crate::document::{MAX_INLINE_POLICY_SIZE, PolicyDocument};
use crate::pattern::{glob_matches_ignore_case, is_glob};
use crate::principal::{FIS_SERVICE, SSM_SERVICE};
use crate::role::{POLICY_TYPE, ROLE_TYPE};
use crate::statement::PolicyStatement;

/// Lambda actions that change a function or its configuration.
pub const LAMBDA_MUTATION_ACTIONS: &[&str] = &[
    "lambda:PutFunctionConcurrency",
    "lambda:DeleteFunctionConcurrency",
    "lambda:UpdateFunctionConfiguration",
    "lambda:UpdateFunctionCode",
    "lambda:DeleteFunction",
    "lambda:PublishVersion",
    "lambda:PutProvisionedConcurrencyConfig",
    "lambda:DeleteProvisionedConcurrencyConfig",
    "lambda:AddPermission",
    "lambda:RemovePermission",
];

/// Actions that have no resource-level permissions and must use `*`.
const NO_RESOURCE_LEVEL_ACTIONS: &[&str] = &[
    "logs:CreateLogDelivery",
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:PutLogEvents",
    "xray:PutTraceSegments",
    "xray:PutTelemetryRecords",
    "xray:GetSamplingRules",
    "xray:GetSamplingTargets",
    "xray:GetSamplingStatisticSummaries",
];

const EXPERIMENT_TYPE: &str = "AWS::FIS::ExperimentTemplate";

/// Severity level for lint findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning - broader than needed, but deployable.
    Warning,
    /// Error - violates least privilege or breaks the experiment.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingKind {
    WildcardResource,
    WildcardAction,
    BroadLambdaGrant,
    UnscopedPassRole,
    PassRoleWithoutService,
    PolicyTooLarge,
    MissingTrust,
    MissingStopCondition,
    InvalidTemplate,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::WildcardResource => "wildcard-resource",
            FindingKind::WildcardAction => "wildcard-action",
            FindingKind::BroadLambdaGrant => "broad-lambda-grant",
            FindingKind::UnscopedPassRole => "unscoped-pass-role",
            FindingKind::PassRoleWithoutService => "pass-role-without-service",
            FindingKind::PolicyTooLarge => "policy-too-large",
            FindingKind::MissingTrust => "missing-trust",
            FindingKind::MissingStopCondition => "missing-stop-condition",
            FindingKind::InvalidTemplate => "invalid-template",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    /// Human-readable message describing the finding.
    pub message: String,
    /// Logical id of the offending resource, when known.
    pub resource: Option<String>,
    /// Stack the resource belongs to, when linting a whole app.
    pub stack: Option<String>,
}

impl Finding {
    fn new(severity: Severity, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            resource: None,
            stack: None,
        }
    }

    pub fn error(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    fn warning(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    fn info(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, message)
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match (&self.stack, &self.resource) {
            (Some(s), Some(r)) => format!(" [{}/{}]", s, r),
            (Some(s), None) => format!(" [{}]", s),
            (None, Some(r)) => format!(" [{}]", r),
            (None, None) => String::new(),
        };
        write!(f, "{} [{}]{}: {}", self.severity, self.kind, location, self.message)
    }
}

/// Results of a lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.count(Severity::Warning) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Most severe first, then by kind and resource.
    pub fn sorted(&self) -> Vec<&Finding> {
        let mut findings: Vec<&Finding> = self.findings.iter().collect();
        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.kind.cmp(&b.kind))
                .then(a.resource.cmp(&b.resource))
        });
        findings
    }
}

/// Stateless linter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyLinter;

impl PolicyLinter {
    pub fn new() -> Self {
        Self
    }

    /// Lint one statement.
    pub fn lint_statement(&self, statement: &PolicyStatement) -> Vec<Finding> {
        match serde_json::to_value(statement) {
            Ok(value) => lint_statement_json(&value),
            Err(err) => {
                tracing::warn!("Statement could not be rendered for linting: {}", err);
                Vec::new()
            }
        }
    }

    /// Lint every statement of a document plus its size.
    pub fn lint_document(&self, document: &PolicyDocument) -> Vec<Finding> {
        match serde_json::to_value(document) {
            Ok(value) => lint_document_json(&value),
            Err(err) => {
                tracing::warn!("Document could not be rendered for linting: {}", err);
                Vec::new()
            }
        }
    }

    /// Lint a rendered template.
    pub fn lint_template(&self, template: &Value) -> LintReport {
        let mut report = LintReport::new();
        let Some(resources) = template.get("Resources").and_then(Value::as_object) else {
            return report;
        };

        for (id, resource) in resources {
            let resource_type = resource.get("Type").and_then(Value::as_str).unwrap_or("");
            let properties = resource.get("Properties").unwrap_or(&Value::Null);
            let findings = match resource_type {
                POLICY_TYPE => properties
                    .get("PolicyDocument")
                    .map(lint_document_json)
                    .unwrap_or_default(),
                ROLE_TYPE => properties
                    .get("Policies")
                    .and_then(Value::as_array)
                    .map(|policies| {
                        policies
                            .iter()
                            .filter_map(|p| p.get("PolicyDocument"))
                            .flat_map(lint_document_json)
                            .collect()
                    })
                    .unwrap_or_default(),
                EXPERIMENT_TYPE => lint_experiment(properties, resources),
                _ => Vec::new(),
            };
            report.extend(findings.into_iter().map(|f| f.with_resource(id.clone())));
        }

        tracing::debug!(
            errors = report.count(Severity::Error),
            warnings = report.count(Severity::Warning),
            "linted template"
        );
        report
    }
}

// =============================================================================
// Statement and document rules
// =============================================================================

fn lint_document_json(document: &Value) -> Vec<Finding> {
    let mut findings: Vec<Finding> = string_or_array(document.get("Statement"))
        .iter()
        .flat_map(|s| lint_statement_json(s))
        .collect();

    let size = serde_json::to_string(document).map(|s| s.len()).unwrap_or(0);
    if size > MAX_INLINE_POLICY_SIZE {
        findings.push(Finding::error(
            FindingKind::PolicyTooLarge,
            format!(
                "policy document is {} characters, above the {} character limit",
                size, MAX_INLINE_POLICY_SIZE
            ),
        ));
    }
    findings
}

fn lint_statement_json(statement: &Value) -> Vec<Finding> {
    let mut findings = Vec::new();
    if statement.get("Effect").and_then(Value::as_str) == Some("Deny") {
        return findings;
    }

    let action_values = string_or_array(statement.get("Action"));
    let actions: Vec<&str> = action_values.iter().filter_map(Value::as_str).collect();
    let resources = string_or_array(statement.get("Resource"));
    let wildcard_resource = resources.iter().any(|r| r.as_str() == Some("*"));

    for action in &actions {
        if *action == "*" || action.ends_with(":*") {
            findings.push(Finding::warning(
                FindingKind::WildcardAction,
                format!("action '{}' grants every operation of the service", action),
            ));
        }
    }

    if wildcard_resource {
        for action in actions.iter().filter(|a| !allows_wildcard_resource(a)) {
            let finding = if is_lambda_mutation(action) {
                Finding::error(
                    FindingKind::WildcardResource,
                    format!("'{}' is granted on every function (Resource '*')", action),
                )
            } else {
                Finding::warning(
                    FindingKind::WildcardResource,
                    format!("'{}' supports resource-level permissions but is granted on '*'", action),
                )
            };
            findings.push(finding);
        }
    }

    if actions.iter().any(|a| is_lambda_mutation(a)) && !wildcard_resource {
        findings.extend(lint_lambda_resources(&resources));
    }

    if actions.iter().any(|a| grants_pass_role(a)) {
        let unscoped = resources
            .iter()
            .any(|r| r.as_str().is_some_and(is_glob));
        if unscoped {
            findings.push(Finding::warning(
                FindingKind::UnscopedPassRole,
                "iam:PassRole is granted on a role pattern instead of one role",
            ));
        }
        let has_service_condition = statement
            .get("Condition")
            .and_then(Value::as_object)
            .is_some_and(|ops| {
                ops.values()
                    .any(|keys| keys.get("iam:PassedToService").is_some())
            });
        if !has_service_condition {
            findings.push(Finding::info(
                FindingKind::PassRoleWithoutService,
                "iam:PassRole does not restrict iam:PassedToService",
            ));
        }
    }

    findings
}

fn lint_lambda_resources(resources: &[Value]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let functions: Vec<&Value> = resources
        .iter()
        .filter(|r| !is_layer_resource(r))
        .collect();

    if functions.len() > 1 {
        findings.push(Finding::error(
            FindingKind::BroadLambdaGrant,
            format!(
                "Lambda mutation actions are granted on {} functions instead of one",
                functions.len()
            ),
        ));
    }
    for resource in functions {
        if let Some(arn) = resource.as_str() {
            if arn.contains(":function:") && is_glob(arn) {
                findings.push(Finding::warning(
                    FindingKind::BroadLambdaGrant,
                    format!("Lambda mutation actions are granted on the pattern '{}'", arn),
                ));
            }
        }
    }
    findings
}

fn allows_wildcard_resource(action: &str) -> bool {
    if is_lambda_mutation(action) {
        return false;
    }
    if NO_RESOURCE_LEVEL_ACTIONS
        .iter()
        .any(|a| a.eq_ignore_ascii_case(action))
    {
        return true;
    }
    // Account-wide describe/list calls.
    action.split_once(':').is_some_and(|(_, op)| {
        let op = op.to_ascii_lowercase();
        !is_glob(&op) && (op.starts_with("describe") || op.starts_with("list"))
    })
}

/// Action names and patterns are matched the way IAM does: globbed and
/// case-insensitive, so `lambda:*` and `lambda:put*` count as mutations.
fn is_lambda_mutation(action: &str) -> bool {
    LAMBDA_MUTATION_ACTIONS
        .iter()
        .any(|mutation| glob_matches_ignore_case(action, mutation))
}

fn grants_pass_role(action: &str) -> bool {
    glob_matches_ignore_case(action, "iam:PassRole")
}

fn is_layer_resource(resource: &Value) -> bool {
    resource.as_str().is_some_and(|arn| arn.contains(":layer:"))
}

fn string_or_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

// =============================================================================
// Experiment rules
// =============================================================================

fn lint_experiment(properties: &Value, resources: &serde_json::Map<String, Value>) -> Vec<Finding> {
    let mut findings = Vec::new();

    let stop_conditions = string_or_array(properties.get("StopConditions"));
    if stop_conditions.is_empty() {
        findings.push(Finding::warning(
            FindingKind::MissingStopCondition,
            "experiment has no stop condition",
        ));
    }
    for condition in &stop_conditions {
        let source = condition.get("Source").and_then(Value::as_str).unwrap_or("");
        let empty_value = condition
            .get("Value")
            .is_none_or(|v| v.as_str().is_some_and(str::is_empty));
        if source != "none" && empty_value {
            findings.push(Finding::warning(
                FindingKind::MissingStopCondition,
                format!("stop condition '{}' has an empty value", source),
            ));
        }
    }

    if let Some(role_id) = properties.get("RoleArn").and_then(get_att_target) {
        if !role_trusts(resources, role_id, FIS_SERVICE) {
            findings.push(Finding::error(
                FindingKind::MissingTrust,
                format!("experiment role '{}' does not trust {}", role_id, FIS_SERVICE),
            ));
        }
    }

    if let Some(actions) = properties.get("Actions").and_then(Value::as_object) {
        for action in actions.values() {
            let Some(parameters) = action.get("Parameters") else {
                continue;
            };
            let mut referenced = Vec::new();
            collect_get_att_targets(parameters, &mut referenced);
            for role_id in referenced {
                let is_role = resources
                    .get(role_id)
                    .and_then(|r| r.get("Type"))
                    .and_then(Value::as_str)
                    == Some(ROLE_TYPE);
                if is_role && !role_trusts(resources, role_id, SSM_SERVICE) {
                    findings.push(Finding::error(
                        FindingKind::MissingTrust,
                        format!("automation role '{}' does not trust {}", role_id, SSM_SERVICE),
                    ));
                }
            }
        }
    }

    findings
}

/// `{"Fn::GetAtt": [id, "Arn"]}` → `id`
fn get_att_target(value: &Value) -> Option<&str> {
    value
        .get("Fn::GetAtt")
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(Value::as_str)
}

fn collect_get_att_targets<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    if let Some(target) = get_att_target(value) {
        if !out.contains(&target) {
            out.push(target);
        }
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_get_att_targets(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_get_att_targets(v, out)),
        _ => {}
    }
}

fn role_trusts(resources: &serde_json::Map<String, Value>, role_id: &str, service: &str) -> bool {
    let Some(document) = resources
        .get(role_id)
        .and_then(|r| r.get("Properties"))
        .and_then(|p| p.get("AssumeRolePolicyDocument"))
    else {
        return false;
    };
    string_or_array(document.get("Statement")).iter().any(|statement| {
        let services = statement
            .get("Principal")
            .and_then(|p| p.get("Service"));
        string_or_array(services)
            .iter()
            .any(|s| s.as_str() == Some(service))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement(actions: &[&str], resources: &[&str]) -> PolicyStatement {
        PolicyStatement::allow(actions.iter().copied(), resources.iter().copied()).unwrap()
    }

    #[test]
    fn test_scoped_lambda_grant_is_clean() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &["lambda:PutFunctionConcurrency", "lambda:DeleteFunctionConcurrency"],
            &["arn:aws:lambda:us-east-1:111122223333:function:demo-Func"],
        ));
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_lambda_mutation_on_star_is_error() {
        let findings = PolicyLinter::new()
            .lint_statement(&statement(&["lambda:UpdateFunctionConfiguration"], &["*"]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].kind, FindingKind::WildcardResource);
    }

    #[test]
    fn test_function_pattern_and_multiple_functions() {
        let linter = PolicyLinter::new();
        let pattern = linter.lint_statement(&statement(
            &["lambda:PutFunctionConcurrency"],
            &["arn:aws:lambda:us-east-1:111122223333:function:*"],
        ));
        assert_eq!(pattern.len(), 1);
        assert_eq!(pattern[0].severity, Severity::Warning);

        let many = linter.lint_statement(&statement(
            &["lambda:PutFunctionConcurrency"],
            &[
                "arn:aws:lambda:us-east-1:111122223333:function:a",
                "arn:aws:lambda:us-east-1:111122223333:function:b",
            ],
        ));
        assert!(many
            .iter()
            .any(|f| f.kind == FindingKind::BroadLambdaGrant && f.severity == Severity::Error));
    }

    #[test]
    fn test_lambda_action_patterns_on_star_are_errors() {
        let linter = PolicyLinter::new();
        for action in ["lambda:*", "lambda:Update*", "*"] {
            let findings = linter.lint_statement(&statement(&[action], &["*"]));
            assert!(
                findings.iter().any(|f| f.kind == FindingKind::WildcardResource
                    && f.severity == Severity::Error),
                "{}: {:?}",
                action,
                findings
            );
        }
    }

    #[test]
    fn test_lowercase_lambda_mutation_on_star_is_error() {
        let findings = PolicyLinter::new()
            .lint_statement(&statement(&["lambda:putfunctionconcurrency"], &["*"]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].kind, FindingKind::WildcardResource);
    }

    #[test]
    fn test_lambda_action_pattern_on_two_functions_is_error() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &["lambda:Put*"],
            &[
                "arn:aws:lambda:us-east-1:111122223333:function:a",
                "arn:aws:lambda:us-east-1:111122223333:function:b",
            ],
        ));
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::BroadLambdaGrant && f.severity == Severity::Error));
    }

    #[test]
    fn test_read_only_lambda_pattern_is_not_a_mutation() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &["lambda:Get*"],
            &[
                "arn:aws:lambda:us-east-1:111122223333:function:a",
                "arn:aws:lambda:us-east-1:111122223333:function:b",
            ],
        ));
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_iam_pattern_triggers_pass_role_rules() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &["iam:*"],
            &["arn:aws:iam::111122223333:role/*"],
        ));
        let kinds: Vec<FindingKind> = findings.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FindingKind::WildcardAction));
        assert!(kinds.contains(&FindingKind::UnscopedPassRole));
        assert!(kinds.contains(&FindingKind::PassRoleWithoutService));

        let lowercase = PolicyLinter::new().lint_statement(&statement(
            &["iam:passrole"],
            &["arn:aws:iam::111122223333:role/a"],
        ));
        assert!(lowercase
            .iter()
            .any(|f| f.kind == FindingKind::PassRoleWithoutService));
    }

    #[test]
    fn test_layer_resource_not_counted_as_function() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &["lambda:UpdateFunctionConfiguration", "lambda:GetLayerVersion"],
            &[
                "arn:aws:lambda:us-east-1:111122223333:function:f",
                "arn:aws:lambda:us-east-1:871265522301:layer:chaos:9",
            ],
        ));
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_logging_actions_may_use_star() {
        let findings = PolicyLinter::new().lint_statement(&statement(
            &[
                "logs:CreateLogStream",
                "logs:CreateLogGroup",
                "logs:PutLogEvents",
                "logs:DescribeLogGroups",
                "logs:DescribeLogStreams",
            ],
            &["*"],
        ));
        assert!(findings.is_empty(), "{:?}", findings);

        let findings = PolicyLinter::new().lint_statement(&statement(&["ssm:PutParameter"], &["*"]));
        assert_eq!(findings[0].kind, FindingKind::WildcardResource);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_wildcard_action() {
        let findings = PolicyLinter::new()
            .lint_statement(&statement(&["ssm:*"], &["arn:aws:ssm:us-east-1:1:document/x"]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::WildcardAction);
    }

    #[test]
    fn test_pass_role_rules() {
        let linter = PolicyLinter::new();
        let unscoped = linter.lint_statement(&statement(&["iam:PassRole"], &["arn:aws:iam::*:role/*"]));
        let kinds: Vec<FindingKind> = unscoped.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FindingKind::UnscopedPassRole));
        assert!(kinds.contains(&FindingKind::PassRoleWithoutService));

        let scoped = PolicyStatement::builder()
            .action("iam:PassRole")
            .resource("arn:aws:iam::111122223333:role/ssmaRole")
            .condition(
                crate::condition::ConditionOperator::StringEquals,
                "iam:PassedToService",
                "ssm.amazonaws.com",
            )
            .build()
            .unwrap();
        assert!(linter.lint_statement(&scoped).is_empty());
    }

    #[test]
    fn test_document_size_limit() {
        let resources: Vec<String> = (0..400)
            .map(|i| format!("arn:aws:ssm:us-east-1:111122223333:parameter/chaos/param-{}", i))
            .collect();
        let doc = PolicyDocument::from_statements([PolicyStatement::allow(
            ["ssm:GetParameter"],
            resources,
        )
        .unwrap()]);
        let findings = PolicyLinter::new().lint_document(&doc);
        assert!(findings.iter().any(|f| f.kind == FindingKind::PolicyTooLarge));
    }

    fn experiment_template(fis_trust: &str, automation_trust: &str, alarm: &str) -> Value {
        json!({
            "Resources": {
                "FisRole": {
                    "Type": "AWS::IAM::Role",
                    "Properties": { "AssumeRolePolicyDocument": {
                        "Statement": [{ "Action": "sts:AssumeRole", "Effect": "Allow",
                                        "Principal": { "Service": fis_trust } }]
                    }}
                },
                "AutomationRole": {
                    "Type": "AWS::IAM::Role",
                    "Properties": { "AssumeRolePolicyDocument": {
                        "Statement": [{ "Action": "sts:AssumeRole", "Effect": "Allow",
                                        "Principal": { "Service": ["iam.amazonaws.com", automation_trust] } }]
                    }}
                },
                "Experiment": {
                    "Type": "AWS::FIS::ExperimentTemplate",
                    "Properties": {
                        "RoleArn": { "Fn::GetAtt": ["FisRole", "Arn"] },
                        "StopConditions": [{ "Source": "aws:cloudwatch:alarm", "Value": alarm }],
                        "Actions": { "ssmaAction": { "Parameters": {
                            "documentParameters": { "Fn::Join": ["", [
                                "{\"AutomationAssumeRole\":\"",
                                { "Fn::GetAtt": ["AutomationRole", "Arn"] },
                                "\"}"
                            ]]}
                        }}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_experiment_trust_checks() {
        let linter = PolicyLinter::new();
        let clean = linter.lint_template(&experiment_template(
            "fis.amazonaws.com",
            "ssm.amazonaws.com",
            "arn:aws:cloudwatch:us-east-1:111122223333:alarm:a",
        ));
        assert!(clean.findings.is_empty(), "{:?}", clean.findings);

        let broken = linter.lint_template(&experiment_template(
            "ssm.amazonaws.com",
            "lambda.amazonaws.com",
            "arn:aws:cloudwatch:us-east-1:111122223333:alarm:a",
        ));
        assert_eq!(broken.of_kind(FindingKind::MissingTrust).count(), 2);
        assert!(broken.has_errors());
        assert!(
            broken
                .findings
                .iter()
                .all(|f| f.resource.as_deref() == Some("Experiment"))
        );
    }

    #[test]
    fn test_empty_alarm_is_reported_as_warning() {
        let report = PolicyLinter::new().lint_template(&experiment_template(
            "fis.amazonaws.com",
            "ssm.amazonaws.com",
            "",
        ));
        assert_eq!(report.count(Severity::Warning), 1);
        assert!(!report.has_errors());
        assert_eq!(report.findings[0].kind, FindingKind::MissingStopCondition);
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::warning(FindingKind::WildcardAction, "too broad")
            .with_resource("Policy")
            .with_stack("Demo");
        assert_eq!(finding.to_string(), "WARN [wildcard-action] [Demo/Policy]: too broad");
    }
}
