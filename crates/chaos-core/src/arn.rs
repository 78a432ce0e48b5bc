//! ARN construction and parsing.
//!
//! ARNs follow `arn:<partition>:<service>:<region>:<account>:<resource>`
//! where the resource part is `<type>`, `<type>/<name>` or `<type>:<name>`.
//! Region and account come from the [`StackContext`] as deferred tokens, so
//! an ARN can be embedded in other resources before synthesis completes.

use thiserror::Error;

use crate::context::StackContext;
use crate::token::Token;

/// How the resource name is separated from the resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArnFormat {
    /// `arn:aws:sqs:us-east-1:111122223333:queue`
    NoResourceName,
    /// `arn:aws:lambda:us-east-1:111122223333:function:name`
    ColonResourceName,
    /// `arn:aws:ssm:us-east-1:111122223333:document/name`
    SlashResourceName,
}

impl ArnFormat {
    fn separator(&self) -> &'static str {
        match self {
            ArnFormat::NoResourceName => "",
            ArnFormat::ColonResourceName => ":",
            ArnFormat::SlashResourceName => "/",
        }
    }
}

/// Identity of a declared resource: its ARN and its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub arn: Token,
    pub name: Token,
}

impl ResourceIdentity {
    pub fn new(arn: impl Into<Token>, name: impl Into<Token>) -> Self {
        Self {
            arn: arn.into(),
            name: name.into(),
        }
    }
}

/// Components of an ARN before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnComponents {
    service: String,
    resource: String,
    resource_name: Option<Token>,
    format: ArnFormat,
    region: Option<Token>,
    account: Option<Token>,
}

impl ArnComponents {
    pub fn new(service: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            resource: resource.into(),
            resource_name: None,
            format: ArnFormat::NoResourceName,
            region: None,
            account: None,
        }
    }

    pub fn resource_name(mut self, name: impl Into<Token>, format: ArnFormat) -> Self {
        self.resource_name = Some(name.into());
        self.format = format;
        self
    }

    /// Override the region (defaults to the stack's).
    pub fn region(mut self, region: impl Into<Token>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Override the account (defaults to the stack's).
    pub fn account(mut self, account: impl Into<Token>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Global services (IAM) carry an empty region.
    pub fn global(self) -> Self {
        self.region("")
    }

    /// Format into an ARN token.
    pub fn format(&self, ctx: &StackContext) -> Token {
        let region = self.region.clone().unwrap_or_else(|| ctx.region());
        let account = self.account.clone().unwrap_or_else(|| ctx.account());

        let mut parts = vec![
            Token::literal("arn:"),
            ctx.partition(),
            Token::literal(format!(":{}:", self.service)),
            region,
            Token::literal(":"),
            account,
            Token::literal(format!(":{}", self.resource)),
        ];
        if let Some(name) = &self.resource_name {
            parts.push(Token::literal(self.format.separator()));
            parts.push(name.clone());
        }
        Token::concat(parts)
    }
}

// =============================================================================
// Resolvers for the resource types the experiments reference
// =============================================================================

/// `arn:…:lambda:<region>:<account>:function:<name>`
pub fn lambda_function(ctx: &StackContext, name: impl Into<Token>) -> Token {
    ArnComponents::new("lambda", "function")
        .resource_name(name, ArnFormat::ColonResourceName)
        .format(ctx)
}

/// `arn:…:ssm:<region>:<account>:parameter/<name>`
///
/// Parameter names are hierarchical and may start with `/`; the separator
/// is not doubled in that case.
pub fn ssm_parameter(ctx: &StackContext, name: impl Into<Token>) -> Token {
    let name = name.into();
    let name = match name.as_literal() {
        Some(literal) => Token::literal(literal.trim_start_matches('/')),
        None => name,
    };
    ArnComponents::new("ssm", "parameter")
        .resource_name(name, ArnFormat::SlashResourceName)
        .format(ctx)
}

/// `arn:…:ssm:<region>:<account>:document/<name>`
pub fn ssm_document(ctx: &StackContext, name: impl Into<Token>) -> Token {
    ArnComponents::new("ssm", "document")
        .resource_name(name, ArnFormat::SlashResourceName)
        .format(ctx)
}

/// `arn:…:ssm:<region>:<account>:automation-definition/<name>:<version>`
pub fn ssm_automation_definition(ctx: &StackContext, name: &str, version: &str) -> Token {
    ArnComponents::new("ssm", "automation-definition")
        .resource_name(format!("{}:{}", name, version), ArnFormat::SlashResourceName)
        .format(ctx)
}

/// `arn:…:ssm:<region>:<account>:automation-execution/<id>`
pub fn ssm_automation_execution(ctx: &StackContext, execution_id: &str) -> Token {
    ArnComponents::new("ssm", "automation-execution")
        .resource_name(execution_id, ArnFormat::SlashResourceName)
        .format(ctx)
}

/// `arn:…:fis:<region>:<account>:experiment/<id>`
pub fn fis_experiment(ctx: &StackContext, experiment_id: &str) -> Token {
    ArnComponents::new("fis", "experiment")
        .resource_name(experiment_id, ArnFormat::SlashResourceName)
        .format(ctx)
}

/// `arn:…:iam::<account>:role/<name>`
pub fn iam_role(ctx: &StackContext, name: impl Into<Token>) -> Token {
    ArnComponents::new("iam", "role")
        .resource_name(name, ArnFormat::SlashResourceName)
        .global()
        .format(ctx)
}

/// `arn:…:logs:<region>:<account>:log-group:<name>:*`
pub fn log_group(ctx: &StackContext, name: impl Into<Token>) -> Token {
    let arn = ArnComponents::new("logs", "log-group")
        .resource_name(name, ArnFormat::ColonResourceName)
        .format(ctx);
    Token::concat([arn, Token::literal(":*")])
}

/// `arn:…:cloudwatch:<region>:<account>:alarm:<name>`
pub fn cloudwatch_alarm(ctx: &StackContext, name: impl Into<Token>) -> Token {
    ArnComponents::new("cloudwatch", "alarm")
        .resource_name(name, ArnFormat::ColonResourceName)
        .format(ctx)
}

// =============================================================================
// Parsing literal ARNs
// =============================================================================

/// Errors from parsing a literal ARN.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArnError {
    #[error("not an ARN: {0}")]
    NotAnArn(String),

    #[error("ARN has too few components: {0}")]
    TooFewComponents(String),
}

/// A literal ARN split into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    /// Everything after the account, e.g. `function:my-fn`.
    pub resource: String,
}

impl ParsedArn {
    /// The resource type (`function`, `parameter`, `role`, ...).
    pub fn resource_type(&self) -> &str {
        self.resource
            .split(['/', ':'])
            .next()
            .unwrap_or(&self.resource)
    }

    /// The resource name following the type, if any.
    pub fn resource_name(&self) -> Option<&str> {
        let idx = self.resource.find(['/', ':'])?;
        Some(&self.resource[idx + 1..])
    }
}

/// Parse a literal ARN.
pub fn parse(arn: &str) -> Result<ParsedArn, ArnError> {
    if !arn.starts_with("arn:") {
        return Err(ArnError::NotAnArn(arn.to_string()));
    }
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() < 6 {
        return Err(ArnError::TooFewComponents(arn.to_string()));
    }
    Ok(ParsedArn {
        partition: parts[1].to_string(),
        service: parts[2].to_string(),
        region: parts[3].to_string(),
        account: parts[4].to_string(),
        resource: parts[5].to_string(),
    })
}
