//! How an on/off schedule state is pushed to a node

use serde::Deserialize;
use serde_json::Value;
use zwave_protocol::CommandClass;

/// Thermostat Mode CC mode values
pub mod thermostat_mode {
    pub const OFF: u8 = 0x00;
    pub const HEAT: u8 = 0x01;
}

/// Endpoint used by thermostats when none is configured
pub const DEFAULT_THERMOSTAT_ENDPOINT: u8 = 1;

fn default_thermostat_endpoint() -> Option<u8> {
    Some(DEFAULT_THERMOSTAT_ENDPOINT)
}

/// Command class API used to switch a node on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Actuator {
    /// Binary Switch `set(bool)`
    BinarySwitch {
        #[serde(default)]
        endpoint: Option<u8>,
    },
    /// Thermostat Mode `set(mode)`, on = heat
    ThermostatMode {
        #[serde(default = "default_thermostat_endpoint")]
        endpoint: Option<u8>,
    },
}

impl Default for Actuator {
    fn default() -> Self {
        Self::BinarySwitch { endpoint: None }
    }
}

impl Actuator {
    #[must_use]
    pub fn command_class(&self) -> CommandClass {
        match self {
            Actuator::BinarySwitch { .. } => CommandClass::BinarySwitch,
            Actuator::ThermostatMode { .. } => CommandClass::ThermostatMode,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<u8> {
        match self {
            Actuator::BinarySwitch { endpoint } | Actuator::ThermostatMode { endpoint } => {
                *endpoint
            }
        }
    }

    /// Arguments for the `set` API method
    #[must_use]
    pub fn set_args(&self, on: bool) -> Vec<Value> {
        match self {
            Actuator::BinarySwitch { .. } => vec![Value::Bool(on)],
            Actuator::ThermostatMode { .. } => {
                let mode = if on {
                    thermostat_mode::HEAT
                } else {
                    thermostat_mode::OFF
                };
                vec![Value::from(mode)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binary_switch_args() {
        let actuator = Actuator::default();
        assert_eq!(actuator.command_class(), CommandClass::BinarySwitch);
        assert_eq!(actuator.endpoint(), None);
        assert_eq!(actuator.set_args(true), vec![json!(true)]);
        assert_eq!(actuator.set_args(false), vec![json!(false)]);
    }

    #[test]
    fn test_thermostat_defaults_to_endpoint_one() {
        let actuator: Actuator =
            serde_json::from_value(json!({"kind": "thermostat_mode"})).unwrap();
        assert_eq!(actuator.endpoint(), Some(DEFAULT_THERMOSTAT_ENDPOINT));
        assert_eq!(actuator.set_args(true), vec![json!(1)]);
        assert_eq!(actuator.set_args(false), vec![json!(0)]);
    }

    #[test]
    fn test_rejects_misspelled_field() {
        let result: Result<Actuator, _> =
            serde_json::from_value(json!({"kind": "thermostat_mode", "endpiont": 2}));
        assert!(result.is_err());

        let actuator: Actuator =
            serde_json::from_value(json!({"kind": "thermostat_mode", "endpoint": 2})).unwrap();
        assert_eq!(actuator.endpoint(), Some(2));
    }
}
