//! zwave-js server command definitions

use serde::{Deserialize, Serialize};

/// Commands understood by the zwave-js server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select the API schema version for this connection
    SetApiSchema,
    /// Start receiving events (returns the full controller state)
    StartListening,
    /// Read a value from the driver cache
    NodeGetValue,
    /// Write a value to a node
    NodeSetValue,
    /// Read a value from the node itself
    NodePollValue,
    /// Dump the state of a node
    NodeGetState,
    /// Invoke a command class API method on an endpoint
    EndpointInvokeCcApi,
}

impl Command {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::SetApiSchema => "set_api_schema",
            Command::StartListening => "start_listening",
            Command::NodeGetValue => "node.get_value",
            Command::NodeSetValue => "node.set_value",
            Command::NodePollValue => "node.poll_value",
            Command::NodeGetState => "node.get_state",
            Command::EndpointInvokeCcApi => "endpoint.invoke_cc_api",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Z-Wave command classes used by this crate
///
/// Serialized as the bare numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum CommandClass {
    /// Binary Switch (0x25)
    BinarySwitch,
    /// Multilevel Switch (0x26)
    MultilevelSwitch,
    /// Thermostat Mode (0x40)
    ThermostatMode,
    /// Configuration (0x70)
    Configuration,
    /// Any other command class
    Other(u16),
}

impl From<u16> for CommandClass {
    fn from(value: u16) -> Self {
        match value {
            0x25 => CommandClass::BinarySwitch,
            0x26 => CommandClass::MultilevelSwitch,
            0x40 => CommandClass::ThermostatMode,
            0x70 => CommandClass::Configuration,
            v => CommandClass::Other(v),
        }
    }
}

impl From<CommandClass> for u16 {
    fn from(value: CommandClass) -> Self {
        match value {
            CommandClass::BinarySwitch => 0x25,
            CommandClass::MultilevelSwitch => 0x26,
            CommandClass::ThermostatMode => 0x40,
            CommandClass::Configuration => 0x70,
            CommandClass::Other(v) => v,
        }
    }
}

impl std::fmt::Display for CommandClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", u16::from(*self))
    }
}

/// Value property, numeric for configuration parameters, named otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Property {
    Number(u32),
    Name(String),
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::Number(n) => write!(f, "{n}"),
            Property::Name(name) => f.write_str(name),
        }
    }
}

/// Identifies a single value on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueId {
    pub command_class: CommandClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<u8>,
    pub property: Property,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_key: Option<Property>,
}

impl ValueId {
    /// Value id of a configuration parameter
    #[must_use]
    pub fn configuration(parameter: u32) -> Self {
        Self {
            command_class: CommandClass::Configuration,
            endpoint: None,
            property: Property::Number(parameter),
            property_key: None,
        }
    }
}

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cc {}", self.command_class)?;
        if let Some(endpoint) = self.endpoint {
            write!(f, " ep {endpoint}")?;
        }
        write!(f, " property {}", self.property)?;
        if let Some(key) = &self.property_key {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}
