//! CloudWatch metrics and alarms.

use chaos_core::{CfnResource, LogicalId, NodeId, ResourceIdentity, Stack, SynthError, Token};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

pub const ALARM_TYPE: &str = "AWS::CloudWatch::Alarm";

/// Default metric period, in seconds.
pub const DEFAULT_PERIOD_SECS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Statistic {
    Average,
    Maximum,
    Minimum,
    SampleCount,
    Sum,
}

/// A metric reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, Token>,
    pub statistic: Statistic,
    pub period_secs: u32,
}

impl Metric {
    pub fn new(namespace: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions: BTreeMap::new(),
            statistic: Statistic::Average,
            period_secs: DEFAULT_PERIOD_SECS,
        }
    }

    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<Token>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    pub fn statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn period(mut self, secs: u32) -> Self {
        self.period_secs = secs;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

/// How missing data points are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

#[derive(Debug, Clone)]
pub struct AlarmProps {
    pub alarm_name: Option<Token>,
    pub description: Option<String>,
    pub metric: Metric,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub evaluation_periods: u32,
    pub treat_missing_data: Option<TreatMissingData>,
    pub actions_enabled: bool,
}

impl AlarmProps {
    pub fn new(metric: Metric, threshold: f64) -> Self {
        Self {
            alarm_name: None,
            description: None,
            metric,
            threshold,
            comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
            evaluation_periods: 1,
            treat_missing_data: None,
            actions_enabled: true,
        }
    }
}

/// A declared alarm. Experiments only use its ARN.
#[derive(Debug, Clone)]
pub struct Alarm {
    logical_id: LogicalId,
    identity: ResourceIdentity,
}

impl Alarm {
    pub fn declare(
        stack: &mut Stack,
        parent: NodeId,
        id: &str,
        props: AlarmProps,
    ) -> Result<Self, SynthError> {
        let scope = stack.scope(parent, id)?;
        let metric = &props.metric;
        let dimensions: Vec<_> = metric
            .dimensions
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect();

        let resource = CfnResource::new(ALARM_TYPE)
            .with_property("ActionsEnabled", props.actions_enabled)?
            .with_optional_property("AlarmDescription", props.description.as_ref())?
            .with_optional_property("AlarmName", props.alarm_name.as_ref())?
            .with_property("ComparisonOperator", props.comparison_operator)?
            .with_optional_property("Dimensions", (!dimensions.is_empty()).then_some(dimensions))?
            .with_property("EvaluationPeriods", props.evaluation_periods)?
            .with_property("MetricName", &metric.metric_name)?
            .with_property("Namespace", &metric.namespace)?
            .with_property("Period", metric.period_secs)?
            .with_property("Statistic", metric.statistic)?
            .with_property("Threshold", props.threshold)?
            .with_optional_property("TreatMissingData", props.treat_missing_data)?;
        let logical_id = stack.add_resource(scope, "Resource", resource)?;

        Ok(Self {
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

    pub fn name(&self) -> &Token {
        &self.identity.name
    }
}
