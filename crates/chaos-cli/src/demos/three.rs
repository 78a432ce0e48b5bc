//! Demo 3: proxy the Runtime API through the chaos Lambda extension.

use anyhow::Result;
use chaos_core::{ChaosConfig, Stack};
use chaos_fis::ExperimentTarget;
use chaos_fis::experiments::extension_proxy;
use chaos_resources::LayerVersion;

use super::{
    ALARM_PERIOD_SECS, DEMO_THREE_STACK, add_outputs, experiment_options, hello_world_function,
    stop_alarm,
};

pub fn stack(config: &ChaosConfig) -> Result<Stack> {
    let demo = &config.demos.three;
    let mut stack = Stack::new(DEMO_THREE_STACK, config.environment.clone())?;
    stack.set_description("Serverless chaos demo 3: chaos extension proxy");
    let root = stack.root();

    // Published by the extension's maintainers in their own account.
    let layer = LayerVersion::published(
        stack.context(),
        &demo.layer.account,
        &demo.layer.layer_name(),
        demo.layer.version,
    );

    let function = hello_world_function(
        &mut stack,
        root,
        "chaosLambdaDemo3",
        Some(demo.function_timeout),
    )?;
    let alarm = stop_alarm(
        &mut stack,
        root,
        "cloudWatchAlarmDemo3",
        function.metric_errors(ALARM_PERIOD_SECS),
        "Checks if we have too many function errors for the test function.",
        &demo.settings,
    )?;

    let target = ExperimentTarget {
        function: function.identity().clone(),
        alarm_arn: alarm.arn().clone(),
    };
    extension_proxy::declare(
        &mut stack,
        root,
        "fisHandlerReplacementExperiment",
        &target,
        layer.arn(),
        demo,
        &experiment_options(config, 3),
    )?;
    add_outputs(&mut stack, &function, &alarm)?;

    Ok(stack)
}
