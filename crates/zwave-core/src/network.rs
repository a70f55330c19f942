//! Typed node operations on top of the zwave-js session

use crate::actuator::Actuator;
use crate::node::NodeSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use zwave_protocol::{Command, CommandClass, ProtocolError, ValueId, ZwaveTransport};

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Node {node_id} returned no value for {value_id}")]
    MissingValue { node_id: u32, value_id: String },

    #[error("Node {node_id} returned an unusable value for {value_id}: {value}")]
    UnexpectedValue {
        node_id: u32,
        value_id: String,
        value: Value,
    },

    #[error("Node {node_id} did not accept the new value for {value_id}")]
    NotAccepted { node_id: u32, value_id: String },

    #[error("Malformed response to {command}: {reason}")]
    MalformedResponse { command: String, reason: String },
}

/// How current parameter values are read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Ask the node itself (`node.poll_value`)
    #[default]
    Poll,
    /// Use the driver's cached value (`node.get_value`)
    Cached,
}

/// Operations the reconciliation loop needs from the device network
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Current value of a configuration parameter
    async fn read_parameter(&self, node_id: u32, parameter: u32) -> Result<u32, NetworkError>;

    /// Write a configuration parameter
    async fn write_parameter(
        &self,
        node_id: u32,
        parameter: u32,
        value: u32,
    ) -> Result<(), NetworkError>;

    /// Switch a node on or off through the given command class API
    async fn switch(&self, node_id: u32, actuator: &Actuator, on: bool)
        -> Result<(), NetworkError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeParams {
    node_id: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueParams<'a> {
    node_id: u32,
    value_id: &'a ValueId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetValueParams<'a, T> {
    node_id: u32,
    value_id: &'a ValueId,
    value: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeCcApiParams<'a> {
    node_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<u8>,
    command_class: CommandClass,
    method_name: &'a str,
    args: Vec<Value>,
}

/// Z-Wave network manager
pub struct ZwaveNetwork {
    /// Low-level transport
    transport: Arc<ZwaveTransport>,
    /// How parameters are read back
    read_mode: ReadMode,
}

impl ZwaveNetwork {
    /// Create a new network manager over an established session
    pub fn new(transport: Arc<ZwaveTransport>, read_mode: ReadMode) -> Self {
        Self {
            transport,
            read_mode,
        }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &ZwaveTransport {
        &self.transport
    }

    /// Read a value from the driver cache
    pub async fn get_value(&self, node_id: u32, value_id: &ValueId) -> Result<Value, NetworkError> {
        let result = self
            .transport
            .call(
                Command::NodeGetValue.as_str(),
                ValueParams { node_id, value_id },
            )
            .await?;
        extract_value(node_id, value_id, result)
    }

    /// Read a value from the node itself
    pub async fn poll_value(
        &self,
        node_id: u32,
        value_id: &ValueId,
    ) -> Result<Value, NetworkError> {
        let result = self
            .transport
            .call(
                Command::NodePollValue.as_str(),
                ValueParams { node_id, value_id },
            )
            .await?;
        extract_value(node_id, value_id, result)
    }

    /// Write a value to a node
    pub async fn set_value(
        &self,
        node_id: u32,
        value_id: &ValueId,
        value: impl Serialize + Send,
    ) -> Result<(), NetworkError> {
        let result = self
            .transport
            .call(
                Command::NodeSetValue.as_str(),
                SetValueParams {
                    node_id,
                    value_id,
                    value,
                },
            )
            .await?;

        // Older schemas report the outcome inside the result as well
        if result.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(NetworkError::NotAccepted {
                node_id,
                value_id: value_id.to_string(),
            });
        }
        Ok(())
    }

    /// Query the state of a node
    pub async fn node_state(&self, node_id: u32) -> Result<NodeSnapshot, NetworkError> {
        let command = Command::NodeGetState.as_str();
        let mut result = self.transport.call(command, NodeParams { node_id }).await?;
        let state = result.get_mut("state").map(Value::take).unwrap_or(Value::Null);
        serde_json::from_value(state).map_err(|e| NetworkError::MalformedResponse {
            command: command.to_string(),
            reason: e.to_string(),
        })
    }

    /// Invoke a command class API method on a node endpoint
    pub async fn invoke_cc_api(
        &self,
        node_id: u32,
        endpoint: Option<u8>,
        command_class: CommandClass,
        method_name: &str,
        args: Vec<Value>,
    ) -> Result<Value, NetworkError> {
        tracing::debug!(
            "Invoking {}.{} on node {} endpoint {:?} args {:?}",
            command_class,
            method_name,
            node_id,
            endpoint,
            args
        );
        let result = self
            .transport
            .call(
                Command::EndpointInvokeCcApi.as_str(),
                InvokeCcApiParams {
                    node_id,
                    endpoint,
                    command_class,
                    method_name,
                    args,
                },
            )
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl DeviceControl for ZwaveNetwork {
    async fn read_parameter(&self, node_id: u32, parameter: u32) -> Result<u32, NetworkError> {
        let value_id = ValueId::configuration(parameter);
        let value = match self.read_mode {
            ReadMode::Poll => self.poll_value(node_id, &value_id).await?,
            ReadMode::Cached => self.get_value(node_id, &value_id).await?,
        };
        value_as_u32(&value).ok_or_else(|| NetworkError::UnexpectedValue {
            node_id,
            value_id: value_id.to_string(),
            value,
        })
    }

    async fn write_parameter(
        &self,
        node_id: u32,
        parameter: u32,
        value: u32,
    ) -> Result<(), NetworkError> {
        self.set_value(node_id, &ValueId::configuration(parameter), value)
            .await
    }

    async fn switch(
        &self,
        node_id: u32,
        actuator: &Actuator,
        on: bool,
    ) -> Result<(), NetworkError> {
        self.invoke_cc_api(
            node_id,
            actuator.endpoint(),
            actuator.command_class(),
            "set",
            actuator.set_args(on),
        )
        .await?;
        Ok(())
    }
}

/// Pull `value` out of a get/poll result, treating absent and null alike
fn extract_value(
    node_id: u32,
    value_id: &ValueId,
    mut result: Value,
) -> Result<Value, NetworkError> {
    match result.get_mut("value").map(Value::take) {
        Some(Value::Null) | None => Err(NetworkError::MissingValue {
            node_id,
            value_id: value_id.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

/// Interpret a JSON number as an unsigned 32-bit parameter value
fn value_as_u32(value: &Value) -> Option<u32> {
    let n = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
    })?;
    u32::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_u32() {
        assert_eq!(value_as_u32(&json!(40)), Some(40));
        assert_eq!(value_as_u32(&json!(40.0)), Some(40));
        assert_eq!(value_as_u32(&json!(-1)), None);
        assert_eq!(value_as_u32(&json!(1.5)), None);
        assert_eq!(value_as_u32(&json!("40")), None);
        assert_eq!(value_as_u32(&json!(u64::from(u32::MAX) + 1)), None);
    }

    #[test]
    fn test_extract_value_rejects_null() {
        let value_id = ValueId::configuration(3);
        assert!(matches!(
            extract_value(5, &value_id, json!({"value": null})),
            Err(NetworkError::MissingValue { node_id: 5, .. })
        ));
        assert!(matches!(
            extract_value(5, &value_id, json!({})),
            Err(NetworkError::MissingValue { .. })
        ));
        assert_eq!(extract_value(5, &value_id, json!({"value": 12})).unwrap(), json!(12));
    }

    #[test]
    fn test_invoke_params_wire_shape() {
        let actuator = Actuator::ThermostatMode { endpoint: Some(1) };
        let params = InvokeCcApiParams {
            node_id: 12,
            endpoint: actuator.endpoint(),
            command_class: actuator.command_class(),
            method_name: "set",
            args: actuator.set_args(true),
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({
                "nodeId": 12,
                "endpoint": 1,
                "commandClass": 64,
                "methodName": "set",
                "args": [1]
            })
        );
    }

    #[test]
    fn test_set_value_params_wire_shape() {
        let value_id = ValueId::configuration(5);
        let params = SetValueParams {
            node_id: 3,
            value_id: &value_id,
            value: 40u32,
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({
                "nodeId": 3,
                "valueId": {"commandClass": 112, "property": 5},
                "value": 40
            })
        );
    }

    #[test]
    fn test_read_mode_names() {
        let mode: ReadMode = serde_json::from_value(json!("cached")).unwrap();
        assert_eq!(mode, ReadMode::Cached);
        assert_eq!(ReadMode::default(), ReadMode::Poll);
    }
}
