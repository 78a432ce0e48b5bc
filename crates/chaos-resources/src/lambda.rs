//! Lambda functions and layers.
//!
//! A [`Function`] owns its execution role. Experiments only need the
//! function's identity (ARN and name) and, for layer-based faults, a layer
//! ARN; both are exposed as deferred tokens.
//!
//! Code assets are not uploaded here. An asset is referenced by a key
//! derived from its declared path; publishing the bytes under that key is
//! the deployment engine's job.

use chaos_core::{
    ArnComponents, ArnFormat, CfnResource, LogicalId, NodeId, ResourceIdentity, Stack,
    StackContext, SynthError, Token,
};
use chaos_policy::{
    LAMBDA_SERVICE, PolicyError, PolicyStatement, Role, RoleProps, TrustRelationship,
    aws_managed_policy,
};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::cloudwatch::{Metric, Statistic};

pub const FUNCTION_TYPE: &str = "AWS::Lambda::Function";
pub const LAYER_VERSION_TYPE: &str = "AWS::Lambda::LayerVersion";

/// Metadata key recording the local path of an asset.
pub const ASSET_PATH_METADATA_KEY: &str = "chaos:asset-path";

const LAMBDA_NAMESPACE: &str = "AWS/Lambda";
const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

/// Lambda runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Python311,
    Python312,
    Nodejs20,
    ProvidedAl2023,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Python311 => "python3.11",
            Runtime::Python312 => "python3.12",
            Runtime::Nodejs20 => "nodejs20.x",
            Runtime::ProvidedAl2023 => "provided.al2023",
        }
    }
}

/// Function or layer code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// A local directory or archive published as an asset.
    Asset(String),
    /// Source inlined into the template (functions only).
    Inline(String),
}

impl Code {
    pub fn from_asset(path: impl Into<String>) -> Self {
        Code::Asset(path.into())
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Code::Inline(source.into())
    }

    /// Object key an asset is published under: hex SHA-256 of its path.
    pub fn asset_key(path: &str) -> String {
        let digest = Sha256::digest(path.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}.zip", hex)
    }

    fn render(&self, ctx: &StackContext) -> Value {
        match self {
            Code::Asset(path) => json!({
                "S3Bucket": asset_bucket(ctx),
                "S3Key": Self::asset_key(path),
            }),
            Code::Inline(source) => json!({ "ZipFile": source }),
        }
    }
}

fn asset_bucket(ctx: &StackContext) -> Token {
    Token::concat([
        Token::literal("chaos-assets-"),
        ctx.account(),
        Token::literal("-"),
        ctx.region(),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracing {
    Active,
    PassThrough,
}

impl Tracing {
    fn mode(&self) -> &'static str {
        match self {
            Tracing::Active => "Active",
            Tracing::PassThrough => "PassThrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionProps {
    pub function_name: Option<String>,
    pub description: Option<String>,
    pub handler: String,
    pub runtime: Runtime,
    pub code: Code,
    pub timeout_secs: Option<u32>,
    pub memory_size: Option<u32>,
    pub tracing: Option<Tracing>,
    pub layers: Vec<Token>,
    pub environment: BTreeMap<String, Token>,
}

impl FunctionProps {
    pub fn new(handler: impl Into<String>, runtime: Runtime, code: Code) -> Self {
        Self {
            function_name: None,
            description: None,
            handler: handler.into(),
            runtime,
            code,
            timeout_secs: None,
            memory_size: None,
            tracing: None,
            layers: Vec::new(),
            environment: BTreeMap::new(),
        }
    }
}

/// A declared function.
#[derive(Debug, Clone)]
pub struct Function {
    logical_id: LogicalId,
    identity: ResourceIdentity,
    role: Role,
}

impl Function {
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Self, PolicyError> {
        let scope = stack.scope(parent, id)?;

        let mut role = Role::declare(
            stack,
            scope,
            "ServiceRole",
            RoleProps::new(TrustRelationship::service(LAMBDA_SERVICE))
                .managed_policy(aws_managed_policy(BASIC_EXECUTION_POLICY)),
        )?;
        if props.tracing == Some(Tracing::Active) {
            role.add_to_policy(
                stack,
                PolicyStatement::allow(
                    ["xray:PutTraceSegments", "xray:PutTelemetryRecords"],
                    ["*"],
                )?,
            )?;
        }

        let environment = (!props.environment.is_empty())
            .then(|| json!({ "Variables": props.environment }));
        let tracing_config = props.tracing.map(|t| json!({ "Mode": t.mode() }));
        let layers = (!props.layers.is_empty()).then_some(&props.layers);

        let mut resource = CfnResource::new(FUNCTION_TYPE)
            .with_property("Code", props.code.render(stack.context()))?
            .with_optional_property("Description", props.description.as_ref())?
            .with_optional_property("Environment", environment)?
            .with_optional_property("FunctionName", props.function_name.as_ref())?
            .with_property("Handler", &props.handler)?
            .with_optional_property("Layers", layers)?
            .with_optional_property("MemorySize", props.memory_size)?
            .with_property("Role", role.arn())?
            .with_property("Runtime", props.runtime.as_str())?
            .with_optional_property("Timeout", props.timeout_secs)?
            .with_optional_property("TracingConfig", tracing_config)?;
        resource.add_dependency(role.logical_id());
        if let Some(policy) = role.default_policy() {
            resource.add_dependency(policy);
        }
        if let Code::Asset(path) = &props.code {
            resource.add_metadata(ASSET_PATH_METADATA_KEY, Value::String(path.clone()));
        }
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        tracing::debug!(
            function = %logical_id,
            runtime = props.runtime.as_str(),
            "declared function"
        );

        Ok(Self {
            identity: ResourceIdentity::new(
                Token::get_att(&logical_id, "Arn"),
                Token::reference(&logical_id),
            ),
            logical_id,
            role,
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn arn(&self) -> &Token {
        &self.identity.arn
    }

    pub fn name(&self) -> &Token {
        &self.identity.name
    }

    /// Execution role.
    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Append a statement to the execution role's default policy.
    pub fn add_to_role_policy(
        &mut self,
        stack: &mut Stack,
        statement: PolicyStatement,
    ) -> Result<(), PolicyError> {
        self.role.add_to_policy(stack, statement)
    }

    /// A metric of this function in the `AWS/Lambda` namespace.
    pub fn metric(&self, metric_name: &str) -> Metric {
        Metric::new(LAMBDA_NAMESPACE, metric_name).dimension("FunctionName", self.name())
    }

    /// Sum of failed invocations per period.
    pub fn metric_errors(&self, period_secs: u32) -> Metric {
        self.metric("Errors")
            .statistic(Statistic::Sum)
            .period(period_secs)
    }

    /// Sum of throttled invocations per period.
    pub fn metric_throttles(&self, period_secs: u32) -> Metric {
        self.metric("Throttles")
            .statistic(Statistic::Sum)
            .period(period_secs)
    }
}

#[derive(Debug, Clone)]
pub struct LayerVersionProps {
    pub layer_version_name: Option<String>,
    pub description: Option<String>,
    /// Local directory published as the layer content.
    pub asset: String,
    pub compatible_runtimes: Vec<Runtime>,
}

/// A layer version, declared in the stack or published elsewhere.
#[derive(Debug, Clone)]
pub struct LayerVersion {
    logical_id: Option<LogicalId>,
    arn: Token,
}

impl LayerVersion {
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        props: LayerVersionProps,
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let runtimes: Vec<&str> = props
            .compatible_runtimes
            .iter()
            .map(Runtime::as_str)
            .collect();
        let content = Code::from_asset(&props.asset).render(stack.context());

        let mut resource = CfnResource::new(LAYER_VERSION_TYPE)
            .with_optional_property(
                "CompatibleRuntimes",
                (!runtimes.is_empty()).then_some(runtimes),
            )?
            .with_property("Content", content)?
            .with_optional_property("Description", props.description.as_ref())?
            .with_optional_property("LayerName", props.layer_version_name.as_ref())?;
        resource.add_metadata(ASSET_PATH_METADATA_KEY, Value::String(props.asset.clone()));
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        Ok(Self {
            // `Ref` of a layer version is its ARN.
            arn: Token::reference(&logical_id),
            logical_id: Some(logical_id),
        })
    }

    /// Reference a layer version by ARN.
    pub fn from_arn(arn: impl Into<Token>) -> Self {
        Self {
            logical_id: None,
            arn: arn.into(),
        }
    }

    /// A layer published in another account, in the stack's region:
    /// `arn:…:lambda:<region>:<account>:layer:<name>:<version>`.
    pub fn published(ctx: &StackContext, account: &str, name: &str, version: u32) -> Self {
        let arn = ArnComponents::new("lambda", "layer")
            .resource_name(format!("{}:{}", name, version), ArnFormat::ColonResourceName)
            .account(account)
            .format(ctx);
        Self::from_arn(arn)
    }

    pub fn logical_id(&self) -> Option<&LogicalId> {
        self.logical_id.as_ref()
    }

    pub fn arn(&self) -> &Token {
        &self.arn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaos_core::Environment;
    use pretty_assertions::assert_eq;

    fn hello_world(name: &str) -> FunctionProps {
        let mut props = FunctionProps::new(
            "lambda_function.lambda_handler",
            Runtime::Python311,
            Code::from_asset("lib/resources/lambda/hello_world"),
        );
        props.function_name = Some(name.to_string());
        props.tracing = Some(Tracing::Active);
        props
    }

    #[test]
    fn test_declare_function_with_tracing() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let function = Function::declare(&mut stack, root, "chaosLambdaDemo1", hello_world("Demo-Func"))
            .unwrap();

        let template = stack.to_template_json().unwrap();
        let rendered = &template["Resources"][function.logical_id().as_str()];
        assert_eq!(rendered["Type"], "AWS::Lambda::Function");
        assert_eq!(rendered["Properties"]["FunctionName"], "Demo-Func");
        assert_eq!(rendered["Properties"]["Runtime"], "python3.11");
        assert_eq!(rendered["Properties"]["TracingConfig"], json!({ "Mode": "Active" }));
        assert_eq!(
            rendered["Properties"]["Role"],
            json!({ "Fn::GetAtt": [function.role().logical_id().as_str(), "Arn"] })
        );
        assert_eq!(
            rendered["Properties"]["Code"]["S3Key"],
            Code::asset_key("lib/resources/lambda/hello_world")
        );
        assert_eq!(
            rendered["Metadata"][ASSET_PATH_METADATA_KEY],
            "lib/resources/lambda/hello_world"
        );

        // Tracing adds the X-Ray statement and the function waits for it.
        let policy_id = function.role().default_policy().unwrap();
        let statements = function.role().policy_document().statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].covers_action("xray:PutTraceSegments"));
        let depends_on = rendered["DependsOn"].as_array().unwrap();
        assert!(depends_on.contains(&json!(policy_id.as_str())));
    }

    #[test]
    fn test_function_without_tracing_has_no_default_policy() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let mut props = hello_world("Demo-Func");
        props.tracing = None;
        props.timeout_secs = Some(30);
        let function = Function::declare(&mut stack, root, "Fn", props).unwrap();
        assert!(function.role().default_policy().is_none());

        let template = stack.to_template_json().unwrap();
        assert_eq!(
            template["Resources"][function.logical_id().as_str()]["Properties"]["Timeout"],
            30
        );
    }

    #[test]
    fn test_metrics() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let function = Function::declare(&mut stack, root, "Fn", hello_world("Demo-Func")).unwrap();

        let throttles = function.metric_throttles(60);
        assert_eq!(throttles.metric_name, "Throttles");
        assert_eq!(throttles.statistic, Statistic::Sum);
        assert_eq!(throttles.period_secs, 60);
        assert_eq!(throttles.dimensions["FunctionName"], *function.name());
        assert_eq!(function.metric_errors(60).metric_name, "Errors");
    }

    #[test]
    fn test_published_layer_arn() {
        let ctx = StackContext::new(
            "Demo",
            Environment::new(Some("111122223333".into()), Some("us-east-1".into())),
        );
        let layer = LayerVersion::published(
            &ctx,
            "871265522301",
            "chaos-lambda-extension-x86_64-unknown-linux-gnu-release",
            9,
        );
        assert_eq!(
            layer.arn().as_literal(),
            Some(
                "arn:aws:lambda:us-east-1:871265522301:layer:chaos-lambda-extension-x86_64-unknown-linux-gnu-release:9"
            )
        );
        assert!(layer.logical_id().is_none());
    }

    #[test]
    fn test_declare_layer_version() {
        let mut stack = Stack::new("Demo", Environment::agnostic()).unwrap();
        let root = stack.root();
        let layer = LayerVersion::declare(
            &mut stack,
            root,
            "chaosPythonLambdaLayerDemo2",
            LayerVersionProps {
                layer_version_name: Some("Demo-chaosPythonLayer".into()),
                description: None,
                asset: "lib/resources/layers/pychaos/python/".into(),
                compatible_runtimes: vec![Runtime::Python311],
            },
        )
        .unwrap();
        let id = layer.logical_id().unwrap();
        assert_eq!(layer.arn(), &Token::reference(id));

        let template = stack.to_template_json().unwrap();
        let properties = &template["Resources"][id.as_str()]["Properties"];
        assert_eq!(properties["CompatibleRuntimes"], json!(["python3.11"]));
        assert_eq!(properties["LayerName"], "Demo-chaosPythonLayer");
    }
}
