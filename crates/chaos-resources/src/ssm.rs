//! SSM Parameter Store string parameters.

use chaos_core::{
    CfnResource, LogicalId, NodeId, ResourceIdentity, Stack, SynthError, Token, arn,
};

pub const PARAMETER_TYPE: &str = "AWS::SSM::Parameter";

/// A declared `String` parameter.
#[derive(Debug, Clone)]
pub struct StringParameter {
    logical_id: LogicalId,
    identity: ResourceIdentity,
}

impl StringParameter {
    /// Declare a parameter. Without a name, SSM generates one and the ARN
    /// is built from the `Ref`.
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        name: Option<&str>,
        value: impl Into<Token>,
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let resource = CfnResource::new(PARAMETER_TYPE)
            .with_optional_property("Name", name)?
            .with_property("Type", "String")?
            .with_property("Value", value.into())?;
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        let name = match name {
            Some(name) => Token::literal(name),
            None => Token::reference(&logical_id),
        };
        Ok(Self {
            identity: ResourceIdentity::new(arn::ssm_parameter(stack.context(), &name), name),
            logical_id,
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn name(&self) -> &Token {
        &self.identity.name
    }

    pub fn arn(&self) -> &Token {
        &self.identity.arn
    }
}
