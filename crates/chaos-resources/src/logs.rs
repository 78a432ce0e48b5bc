//! CloudWatch Logs log groups.

use chaos_core::{
    CfnResource, LogicalId, NodeId, RemovalPolicy, ResourceIdentity, Stack, SynthError, Token,
};

pub const LOG_GROUP_TYPE: &str = "AWS::Logs::LogGroup";

/// Retention periods accepted by CloudWatch Logs (subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionDays {
    OneDay,
    ThreeDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    OneYear,
    Infinite,
}

impl RetentionDays {
    /// Days, or `None` for never expire.
    pub fn days(&self) -> Option<u32> {
        match self {
            RetentionDays::OneDay => Some(1),
            RetentionDays::ThreeDays => Some(3),
            RetentionDays::OneWeek => Some(7),
            RetentionDays::TwoWeeks => Some(14),
            RetentionDays::OneMonth => Some(30),
            RetentionDays::OneYear => Some(365),
            RetentionDays::Infinite => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogGroupProps {
    pub log_group_name: Option<String>,
    pub retention: RetentionDays,
    pub removal_policy: RemovalPolicy,
}

impl LogGroupProps {
    /// A named group kept for a week and deleted with the stack, as used by
    /// experiment logging.
    pub fn experiment_logs(name: impl Into<String>) -> Self {
        Self {
            log_group_name: Some(name.into()),
            retention: RetentionDays::OneWeek,
            removal_policy: RemovalPolicy::Delete,
        }
    }
}

/// A declared log group.
#[derive(Debug, Clone)]
pub struct LogGroup {
    logical_id: LogicalId,
    identity: ResourceIdentity,
}

impl LogGroup {
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        props: LogGroupProps,
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let resource = CfnResource::new(LOG_GROUP_TYPE)
            .with_optional_property("LogGroupName", props.log_group_name.as_ref())?
            .with_optional_property("RetentionInDays", props.retention.days())?
            .with_removal_policy(props.removal_policy);
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        Ok(Self {
            // The `Arn` attribute of a log group already ends in `:*`.
            identity: ResourceIdentity::new(
                Token::get_att(&logical_id, "Arn"),
                Token::reference(&logical_id),
            ),
            logical_id,
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
}
