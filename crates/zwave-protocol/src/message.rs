//! zwave-js server message structure
//!
//! Outbound requests are flat JSON objects:
//! ```text
//! {"command": "<name>", "messageId": <id>, ...command parameters}
//! ```
//! Inbound messages are tagged by `type`:
//! ```text
//! {"type": "result", "messageId": <id>, "success": <bool>, "result": {...}}
//! {"type": "event", "event": {"source": "...", "event": "...", ...}}
//! ```

use crate::types::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request ready to be written to the wire
#[derive(Debug, Clone)]
pub struct Request {
    pub message_id: u64,
    pub command: String,
    pub params: Map<String, Value>,
}

impl Request {
    /// Create a new request from already-validated parameters
    #[must_use]
    pub fn new(message_id: u64, command: &str, params: Map<String, Value>) -> Self {
        Self {
            message_id,
            command: command.to_string(),
            params,
        }
    }

    /// Serialize to the JSON text sent in a WebSocket frame
    #[must_use]
    pub fn encode(&self) -> String {
        let mut body = self.params.clone();
        body.insert("command".to_string(), Value::from(self.command.as_str()));
        body.insert("messageId".to_string(), Value::from(self.message_id));
        Value::Object(body).to_string()
    }
}

/// Convert command parameters into the object merged into a request.
///
/// `null` (or `()`) means "no parameters"; anything else must serialize to
/// a JSON object.
pub fn params_object(params: impl Serialize) -> Result<Map<String, Value>, ProtocolError> {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ProtocolError::InvalidParams(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ProtocolError::InvalidParams(e.to_string())),
    }
}

/// Inbound message, decoded once at the transport boundary
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Response to a request, correlated by message id
    Result(ResultMessage),
    /// Unsolicited event
    Event { event: ZwaveEvent },
}

impl Inbound {
    /// Decode a text frame. Unknown `type` tags are rejected.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text)
            .map_err(|e| ProtocolError::InvalidFrame(format!("{e}: {text}")))
    }
}

/// Result frame
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    pub message_id: u64,
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error_code: Option<String>,
    /// Remaining fields (error messages, zwave error codes)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultMessage {
    /// Turn the acknowledgement into the call outcome
    pub fn into_result(self, command: &str) -> Result<Value, ProtocolError> {
        if self.success {
            return Ok(self.result);
        }
        Err(ProtocolError::Rejected {
            command: command.to_string(),
            error_code: self.error_code.unwrap_or_else(|| "unknown".to_string()),
            details: Value::Object(self.extra).to_string(),
        })
    }
}

/// Unsolicited event forwarded to the registered handler
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZwaveEvent {
    /// Emitter: "controller", "node" or "driver"
    pub source: String,
    /// Event name, e.g. "value updated"
    pub event: String,
    #[serde(default)]
    pub node_id: Option<u32>,
    /// Event specific payload
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_encoding_flattens_params() {
        let params = params_object(json!({
            "nodeId": 5,
            "valueId": {"commandClass": 112, "property": 3}
        }))
        .unwrap();
        let request = Request::new(7, "node.poll_value", params);
        let encoded: Value = serde_json::from_str(&request.encode()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "command": "node.poll_value",
                "messageId": 7,
                "nodeId": 5,
                "valueId": {"commandClass": 112, "property": 3}
            })
        );
    }

    #[test]
    fn test_params_must_be_object() {
        assert!(params_object(()).unwrap().is_empty());
        assert!(matches!(
            params_object(vec![1, 2]),
            Err(ProtocolError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_decode_success_result() {
        let inbound = Inbound::decode(
            r#"{"type":"result","messageId":3,"success":true,"result":{"value":40}}"#,
        )
        .unwrap();
        let Inbound::Result(result) = inbound else {
            panic!("expected result");
        };
        assert_eq!(result.message_id, 3);
        assert_eq!(result.into_result("node.get_value").unwrap(), json!({"value": 40}));
    }

    #[test]
    fn test_decode_failed_result() {
        let text = json!({
            "type": "result",
            "messageId": 4,
            "success": false,
            "errorCode": "node_not_found",
            "message": "gone"
        })
        .to_string();
        let inbound = Inbound::decode(&text).unwrap();
        let Inbound::Result(result) = inbound else {
            panic!("expected result");
        };
        match result.into_result("node.set_value") {
            Err(ProtocolError::Rejected {
                command,
                error_code,
                details,
            }) => {
                assert_eq!(command, "node.set_value");
                assert_eq!(error_code, "node_not_found");
                assert!(details.contains("gone"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_decode_event() {
        let text = json!({
            "type": "event",
            "event": {
                "source": "node",
                "event": "value updated",
                "nodeId": 9,
                "args": {"newValue": 1}
            }
        })
        .to_string();
        let inbound = Inbound::decode(&text).unwrap();
        let Inbound::Event { event } = inbound else {
            panic!("expected event");
        };
        assert_eq!(event.source, "node");
        assert_eq!(event.event, "value updated");
        assert_eq!(event.node_id, Some(9));
        assert_eq!(event.args["args"], json!({"newValue": 1}));
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        assert!(matches!(
            Inbound::decode(r#"{"type":"bogus","messageId":1}"#),
            Err(ProtocolError::InvalidFrame(_))
        ));
        assert!(matches!(
            Inbound::decode("not json"),
            Err(ProtocolError::InvalidFrame(_))
        ));
        // A result without the success flag is malformed, not a silent failure
        assert!(Inbound::decode(r#"{"type":"result","messageId":1}"#).is_err());
    }
}
