//! Demo 2: swap the handler for a chaos wrapper shipped in a layer.

use anyhow::Result;
use chaos_core::{ChaosConfig, Stack, arn};
use chaos_fis::experiments::handler_replacement::{self, PARAMETER_ACTIONS, parameter_prefix};
use chaos_fis::{ChaosConfiguration, ExperimentTarget};
use chaos_policy::{InlinePolicy, PolicyStatement};
use chaos_resources::{LayerVersion, LayerVersionProps, Runtime, StringParameter};

use super::{
    ALARM_PERIOD_SECS, DEMO_TWO_STACK, add_outputs, experiment_options, hello_world_function,
    stop_alarm,
};

const CHAOS_LAYER_ASSET: &str = "lib/resources/layers/pychaos/python/";

pub fn stack(config: &ChaosConfig) -> Result<Stack> {
    let demo = &config.demos.two;
    let mut stack = Stack::new(DEMO_TWO_STACK, config.environment.clone())?;
    stack.set_description("Serverless chaos demo 2: handler replacement");
    let root = stack.root();

    let function = hello_world_function(&mut stack, root, "chaosLambdaDemo2", None)?;

    // The chaos handler runs inside the function and reads its
    // configuration from Parameter Store.
    let parameters_arn =
        arn::ssm_parameter(stack.context(), parameter_prefix(&demo.parameter_name));
    InlinePolicy::declare(
        &mut stack,
        root,
        "additional-ssm-policy",
        vec![PolicyStatement::allow(PARAMETER_ACTIONS, [parameters_arn])?],
        &[function.role()],
    )?;

    let alarm = stop_alarm(
        &mut stack,
        root,
        "cloudWatchAlarmDemo2",
        function.metric_errors(ALARM_PERIOD_SECS),
        "Checks if we have too many function errors for the test function.",
        &demo.settings,
    )?;

    let parameter = StringParameter::declare(
        &mut stack,
        root,
        "chaosConfigSsmParameterDemo2",
        Some(demo.parameter_name.as_str()),
        ChaosConfiguration::disabled_json(),
    )?;

    let layer_name = format!("{}-chaosPythonLayer", stack.name());
    let layer = LayerVersion::declare(
        &mut stack,
        root,
        "chaosPythonLambdaLayerDemo2",
        LayerVersionProps {
            layer_version_name: Some(layer_name),
            description: None,
            asset: CHAOS_LAYER_ASSET.to_string(),
            compatible_runtimes: vec![Runtime::Python311],
        },
    )?;

    let target = ExperimentTarget {
        function: function.identity().clone(),
        alarm_arn: alarm.arn().clone(),
    };
    let declared = handler_replacement::declare(
        &mut stack,
        root,
        "fisHandlerReplacementExperiment",
        &target,
        layer.arn(),
        demo,
        &experiment_options(config, 2),
    )?;

    add_outputs(&mut stack, &function, &alarm)?;

    tracing::debug!(
        parameter = %parameter.name(),
        experiment = %declared.experiment.logical_id(),
        "declared demo two"
    );
    Ok(stack)
}
