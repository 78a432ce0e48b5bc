//! Demo 1: throttle the function by lowering its reserved concurrency.

use anyhow::Result;
use chaos_core::{ChaosConfig, Stack};
use chaos_fis::ExperimentTarget;
use chaos_fis::experiments::concurrency;

use super::{
    ALARM_PERIOD_SECS, DEMO_ONE_STACK, add_outputs, experiment_options, hello_world_function,
    stop_alarm,
};

pub fn stack(config: &ChaosConfig) -> Result<Stack> {
    let demo = &config.demos.one;
    let mut stack = Stack::new(DEMO_ONE_STACK, config.environment.clone())?;
    stack.set_description("Serverless chaos demo 1: Lambda reserved concurrency");
    let root = stack.root();

    let function = hello_world_function(&mut stack, root, "chaosLambdaDemo1", None)?;
    let alarm = stop_alarm(
        &mut stack,
        root,
        "cloudWatchAlarmDemo1",
        function.metric_throttles(ALARM_PERIOD_SECS),
        "Checks if we have too many throttled function invocations for the test function.",
        &demo.settings,
    )?;

    let target = ExperimentTarget {
        function: function.identity().clone(),
        alarm_arn: alarm.arn().clone(),
    };
    concurrency::declare(
        &mut stack,
        root,
        "fisLambdaConcurrencyExperimentDemo1",
        &target,
        demo,
        &experiment_options(config, 1),
    )?;

    add_outputs(&mut stack, &function, &alarm)?;
    Ok(stack)
}
