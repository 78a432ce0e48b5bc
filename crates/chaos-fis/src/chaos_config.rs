//! Configuration read by the chaos handler of the handler-replacement
//! experiment.
//!
//! The handler polls one SSM parameter for a JSON object. The experiment
//! writes the fault to inject; the stack seeds the parameter with a
//! disabled configuration so the function behaves normally outside
//! experiments.

use chaos_core::config::FaultSettings;
use serde::Serialize;

/// JSON payload stored in the chaos parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaosConfiguration {
    pub fault_type: String,
    pub is_enabled: bool,
    pub delay: u64,
    pub error_code: u16,
    pub exception_msg: String,
    pub rate: f64,
}

impl ChaosConfiguration {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Seed value of the parameter: only the switch, turned off.
    pub fn disabled_json() -> String {
        r#"{ "is_enabled": false }"#.to_string()
    }
}

impl From<&FaultSettings> for ChaosConfiguration {
    fn from(settings: &FaultSettings) -> Self {
        Self {
            fault_type: settings.fault_type.clone(),
            is_enabled: settings.is_enabled,
            delay: settings.delay,
            error_code: settings.error_code,
            exception_msg: settings.exception_msg.clone(),
            rate: settings.rate,
        }
    }
}
