//! Per-demo settings.

use serde::{Deserialize, Serialize};

/// Settings shared by every experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSettings {
    /// Whether the demo stack is part of the app.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Alarm threshold of the stop condition.
    #[serde(default = "default_alarm_threshold")]
    pub alarm_threshold: f64,

    /// How long the fault stays injected (ISO-8601 duration).
    #[serde(default = "default_duration")]
    pub duration: String,

    /// Upper bound of the automation action (ISO-8601 duration).
    #[serde(default = "default_max_duration")]
    pub max_duration: String,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            alarm_threshold: default_alarm_threshold(),
            duration: default_duration(),
            max_duration: default_max_duration(),
        }
    }
}

/// Demo 1: reserved concurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyDemoConfig {
    #[serde(flatten)]
    pub settings: ExperimentSettings,

    /// Reserved concurrency applied during the experiment.
    #[serde(default = "default_concurrency_level")]
    pub concurrency_level: u32,
}

impl Default for ConcurrencyDemoConfig {
    fn default() -> Self {
        Self {
            settings: ExperimentSettings::default(),
            concurrency_level: default_concurrency_level(),
        }
    }
}

/// Fault injected by the chaos layer of demo 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultSettings {
    /// `exception`, `latency`, `status_code` or `diskspace`.
    #[serde(default = "default_fault_type")]
    pub fault_type: String,

    /// Whether the chaos handler injects the fault while the experiment
    /// runs. Defaults to `true`, unlike the stock CDK demo, which passed
    /// `false` and so ran the experiment without injecting anything. Set it
    /// to `false` to reproduce that dry run. The SSM parameter itself
    /// always starts disabled.
    #[serde(default = "default_true")]
    pub is_enabled: bool,

    /// Injected latency in milliseconds.
    #[serde(default = "default_delay")]
    pub delay: u64,

    #[serde(default = "default_error_code")]
    pub error_code: u16,

    #[serde(default = "default_exception_msg")]
    pub exception_msg: String,

    /// Fraction of invocations affected, in `[0, 1]`.
    #[serde(default = "default_rate")]
    pub rate: f64,
}

impl Default for FaultSettings {
    fn default() -> Self {
        Self {
            fault_type: default_fault_type(),
            is_enabled: true,
            delay: default_delay(),
            error_code: default_error_code(),
            exception_msg: default_exception_msg(),
            rate: default_rate(),
        }
    }
}

/// Demo 2: handler replacement with a chaos layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerReplacementDemoConfig {
    #[serde(flatten)]
    pub settings: ExperimentSettings,

    /// SSM parameter holding the chaos configuration.
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,

    #[serde(default)]
    pub chaos: FaultSettings,
}

impl Default for HandlerReplacementDemoConfig {
    fn default() -> Self {
        Self {
            settings: ExperimentSettings::default(),
            parameter_name: default_parameter_name(),
            chaos: FaultSettings::default(),
        }
    }
}

/// The published chaos extension layer used by demo 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionLayerConfig {
    /// Account hosting the public layer.
    #[serde(default = "default_layer_account")]
    pub account: String,

    #[serde(default = "default_layer_version")]
    pub version: u32,

    /// `x86_64` or `aarch64`.
    #[serde(default = "default_layer_architecture")]
    pub architecture: String,
}

impl Default for ExtensionLayerConfig {
    fn default() -> Self {
        Self {
            account: default_layer_account(),
            version: default_layer_version(),
            architecture: default_layer_architecture(),
        }
    }
}

impl ExtensionLayerConfig {
    /// Name of the published layer for the configured architecture.
    pub fn layer_name(&self) -> String {
        format!(
            "chaos-lambda-extension-{}-unknown-linux-gnu-release",
            self.architecture
        )
    }
}

/// Demo 3: chaos extension proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDemoConfig {
    #[serde(flatten)]
    pub settings: ExperimentSettings,

    /// Function timeout in seconds.
    #[serde(default = "default_function_timeout")]
    pub function_timeout: u32,

    #[serde(default)]
    pub layer: ExtensionLayerConfig,

    /// `latency` or `response`.
    #[serde(default = "default_chaos_type")]
    pub chaos_type: String,

    #[serde(default = "default_chaos_latency")]
    pub chaos_latency: String,

    #[serde(default = "default_chaos_response")]
    pub chaos_response: String,

    #[serde(default = "default_chaos_probability")]
    pub chaos_probability: String,
}

impl Default for ExtensionDemoConfig {
    fn default() -> Self {
        Self {
            settings: ExperimentSettings::default(),
            function_timeout: default_function_timeout(),
            layer: ExtensionLayerConfig::default(),
            chaos_type: default_chaos_type(),
            chaos_latency: default_chaos_latency(),
            chaos_response: default_chaos_response(),
            chaos_probability: default_chaos_probability(),
        }
    }
}

/// Settings of the three demos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemosConfig {
    #[serde(default)]
    pub one: ConcurrencyDemoConfig,

    #[serde(default)]
    pub two: HandlerReplacementDemoConfig,

    #[serde(default)]
    pub three: ExtensionDemoConfig,
}

impl DemosConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let rate = self.two.chaos.rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(format!("demos.two.chaos.rate must be within [0, 1], got {}", rate));
        }
        if !self.two.parameter_name.starts_with('/') {
            return Err(format!(
                "demos.two.parameter_name must be an absolute parameter path, got '{}'",
                self.two.parameter_name
            ));
        }
        if !matches!(self.three.layer.architecture.as_str(), "x86_64" | "aarch64") {
            return Err(format!(
                "demos.three.layer.architecture must be x86_64 or aarch64, got '{}'",
                self.three.layer.architecture
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_alarm_threshold() -> f64 {
    10.0
}

fn default_duration() -> String {
    "PT5M".to_string()
}

fn default_max_duration() -> String {
    "PT10M".to_string()
}

fn default_concurrency_level() -> u32 {
    10
}

fn default_fault_type() -> String {
    "exception".to_string()
}

fn default_delay() -> u64 {
    400
}

fn default_error_code() -> u16 {
    404
}

fn default_exception_msg() -> String {
    "This is chaos".to_string()
}

fn default_rate() -> f64 {
    1.0
}

fn default_parameter_name() -> String {
    "/ChaosInjection/ChaosConfigSsmParameter".to_string()
}

fn default_layer_account() -> String {
    "871265522301".to_string()
}

fn default_layer_version() -> u32 {
    9
}

fn default_layer_architecture() -> String {
    "x86_64".to_string()
}

fn default_function_timeout() -> u32 {
    30
}

fn default_chaos_type() -> String {
    "response".to_string()
}

fn default_chaos_latency() -> String {
    "10".to_string()
}

fn default_chaos_response() -> String {
    r#"{"statusCode": 500, "body": "hello, Chaos!!!"}"#.to_string()
}

fn default_chaos_probability() -> String {
    "1".to_string()
}
