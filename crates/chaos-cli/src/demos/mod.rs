//! The three demo stacks.
//!
//! Each demo deploys a hello-world function, an alarm on one of its
//! metrics and one experiment that injects a fault into the function until
//! the alarm fires or the experiment duration elapses.

pub mod one;
pub mod three;
pub mod two;

use anyhow::{Context, Result};
use chaos_core::config::ExperimentSettings;
use chaos_core::{App, ChaosConfig, NodeId, Output, Stack, Token};
use chaos_fis::ExperimentOptions;
use chaos_resources::{
    Alarm, AlarmProps, Code, Function, FunctionProps, Metric, Runtime, Tracing, TreatMissingData,
};

pub const DEMO_ONE_STACK: &str = "ServerlessChaos-Demo-1";
pub const DEMO_TWO_STACK: &str = "ServerlessChaos-Demo-2";
pub const DEMO_THREE_STACK: &str = "ServerlessChaos-Demo-3";

const HELLO_WORLD_ASSET: &str = "lib/resources/lambda/hello_world";
const HELLO_WORLD_HANDLER: &str = "lambda_function.lambda_handler";
const HELLO_WORLD_DESCRIPTION: &str =
    "Simple hello_world lambda function that will be used in chaos experiments";

/// Alarm metric period, in seconds.
const ALARM_PERIOD_SECS: u32 = 60;

/// Build the app with every enabled demo.
pub fn build_app(config: &ChaosConfig) -> Result<App> {
    let mut app = App::new();
    let demos = &config.demos;

    if demos.one.settings.enabled {
        app.add_stack(one::stack(config).context("failed to declare demo one")?)?;
    }
    if demos.two.settings.enabled {
        app.add_stack(two::stack(config).context("failed to declare demo two")?)?;
    }
    if demos.three.settings.enabled {
        app.add_stack(three::stack(config).context("failed to declare demo three")?)?;
    }

    tracing::debug!(stacks = app.stacks().len(), "built app");
    Ok(app)
}

fn experiment_options(config: &ChaosConfig, demo: u8) -> ExperimentOptions {
    let mut options = ExperimentOptions::for_demo(demo);
    options.documents_dir = config.documents_dir.clone();
    options
}

/// The function every demo injects faults into.
fn hello_world_function(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    timeout_secs: Option<u32>,
) -> Result<Function> {
    let mut props = FunctionProps::new(
        HELLO_WORLD_HANDLER,
        Runtime::Python311,
        Code::from_asset(HELLO_WORLD_ASSET),
    );
    props.function_name = Some(format!("{}-Func", stack.name()));
    props.description = Some(HELLO_WORLD_DESCRIPTION.to_string());
    props.tracing = Some(Tracing::Active);
    props.timeout_secs = timeout_secs;

    Ok(Function::declare(stack, parent, id, props)?)
}

/// Stop-condition alarm on `metric`.
fn stop_alarm(
    stack: &mut Stack,
    parent: NodeId,
    id: &str,
    metric: Metric,
    description: &str,
    settings: &ExperimentSettings,
) -> Result<Alarm> {
    let mut props = AlarmProps::new(metric, settings.alarm_threshold);
    props.alarm_name = Some(Token::literal(format!("{}-CloudWatchAlarm", stack.name())));
    props.description = Some(description.to_string());
    props.treat_missing_data = Some(TreatMissingData::NotBreaching);

    Ok(Alarm::declare(stack, parent, id, props)?)
}

/// Outputs shared by the demos.
fn add_outputs(stack: &mut Stack, function: &Function, alarm: &Alarm) -> Result<()> {
    let root = stack.root();
    stack.add_output(
        root,
        "FunctionName",
        Output::new(function.name()).description("Name of the function faults are injected into"),
    )?;
    stack.add_output(
        root,
        "CloudWatchAlarmName",
        Output::new(alarm.name()).description("Alarm that stops the experiment"),
    )?;
    Ok(())
}
