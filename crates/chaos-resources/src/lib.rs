//! Resource declarations the chaos demos are built from.
//!
//! Each type declares one CloudFormation resource (plus any companion
//! resources it owns, such as a function's execution role) into a
//! [`chaos_core::Stack`] and exposes the deferred identity other resources
//! reference.

pub mod cloudwatch;
pub mod lambda;
pub mod logs;
pub mod ssm;

pub use cloudwatch::{
    ALARM_TYPE, Alarm, AlarmProps, ComparisonOperator, Metric, Statistic, TreatMissingData,
};
pub use lambda::{
    Code, FUNCTION_TYPE, Function, FunctionProps, LAYER_VERSION_TYPE, LayerVersion,
    LayerVersionProps, Runtime, Tracing,
};
pub use logs::{LOG_GROUP_TYPE, LogGroup, LogGroupProps, RetentionDays};
pub use ssm::{PARAMETER_TYPE, StringParameter};
