//! `chaos check` command implementation.
//!
//! Renders every selected stack and runs two passes over the JSON:
//! - JSON Schema validation against the embedded template schema
//! - the least-privilege policy lint

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use chaos_core::App;
use chaos_policy::{Finding, FindingKind, LintReport, PolicyLinter, Severity};

/// Embedded so validation works without the repository checkout.
mod embedded_schemas {
    pub const CLOUDFORMATION_TEMPLATE: &str =
        include_str!("../../../../schemas/CloudFormationTemplate.schema.json");
}

/// Lint the selected stacks (all when `stacks` is empty).
pub fn check_stacks(app: &App, stacks: &[String]) -> Result<LintReport> {
    let schema: JsonValue = serde_json::from_str(embedded_schemas::CLOUDFORMATION_TEMPLATE)
        .context("Embedded template schema is not valid JSON")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile template schema: {}", e))?;
    let linter = PolicyLinter::new();

    let mut report = LintReport::new();
    for stack in app.select(stacks)? {
        let template = stack
            .to_template_json()
            .with_context(|| format!("Failed to render stack '{}'", stack.name()))?;

        report.extend(
            validate_template(&validator, &template)
                .into_iter()
                .map(|f| f.with_stack(stack.name())),
        );
        report.extend(
            linter
                .lint_template(&template)
                .findings
                .into_iter()
                .map(|f| f.with_stack(stack.name())),
        );
        tracing::debug!(stack = %stack.name(), "checked stack");
    }
    Ok(report)
}

fn validate_template(validator: &jsonschema::Validator, template: &JsonValue) -> Vec<Finding> {
    validator
        .iter_errors(template)
        .map(|error| {
            let path = error.instance_path().to_string();
            let location = if path.is_empty() {
                "(root)".to_string()
            } else {
                path
            };
            Finding::error(FindingKind::InvalidTemplate, error.to_string()).with_resource(location)
        })
        .collect()
}

/// Run the check and fail on errors, or on warnings with `deny_warnings`.
pub fn run(app: &App, stacks: &[String], deny_warnings: bool) -> Result<()> {
    println!("🔍 Checking {} stack(s)...", app.select(stacks)?.len());

    let report = check_stacks(app, stacks)?;
    print_report(&report);

    let errors = report.count(Severity::Error);
    let warnings = report.count(Severity::Warning);
    if errors > 0 {
        anyhow::bail!("Check failed with {} error(s)", errors);
    }
    if deny_warnings && warnings > 0 {
        anyhow::bail!("Check failed with {} warning(s) (--deny-warnings)", warnings);
    }
    Ok(())
}

fn print_report(report: &LintReport) {
    let sorted = report.sorted();
    let errors: Vec<_> = sorted
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    let warnings: Vec<_> = sorted
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .collect();
    let infos: Vec<_> = sorted
        .iter()
        .filter(|f| f.severity == Severity::Info)
        .collect();

    if !errors.is_empty() {
        println!("\n❌ Errors ({}):", errors.len());
        println!("{}", "─".repeat(60));
        for finding in &errors {
            print_finding(finding);
        }
    }

    if !warnings.is_empty() {
        println!("\n⚠️  Warnings ({}):", warnings.len());
        println!("{}", "─".repeat(60));
        for finding in &warnings {
            print_finding(finding);
        }
    }

    if !infos.is_empty() {
        println!("\nℹ️  Info ({}):", infos.len());
        println!("{}", "─".repeat(60));
        for finding in &infos {
            print_finding(finding);
        }
    }

    println!();
    println!("{}", "═".repeat(60));
    if errors.is_empty() && warnings.is_empty() {
        println!("✅ All checks passed!");
    } else {
        println!(
            "Summary: {} error(s), {} warning(s)",
            errors.len(),
            warnings.len()
        );
    }
}

fn print_finding(finding: &Finding) {
    let icon = match finding.severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    };
    let location = match (&finding.stack, &finding.resource) {
        (Some(s), Some(r)) => format!(" [{}/{}]", s, r),
        (Some(s), None) => format!(" [{}]", s),
        (None, Some(r)) => format!(" [{}]", r),
        (None, None) => String::new(),
    };
    println!(
        "  {} [{}]{}: {}",
        icon, finding.kind, location, finding.message
    );
}
