//! Error types for the reconciliation engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors found while loading the node roster
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed TOML or unknown field
    #[error("Malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Endpoint is not a WebSocket URL
    #[error("zwavejs_api_endpoint {0:?} is not a ws:// or wss:// URL")]
    InvalidEndpoint(String),

    /// Device type defined twice
    #[error("device type {0}: duplicate")]
    DuplicateDeviceType(String),

    /// Device type parameter defined twice
    #[error("device type {device_type}: parameter {param} is present multiple times")]
    DuplicateDeviceTypeParam { device_type: String, param: u32 },

    /// Both `default` and `default_hex`
    #[error("device type {device_type}: parameter {param} has both default and default_hex values")]
    ConflictingDefault { device_type: String, param: u32 },

    /// Malformed `default_hex`
    #[error("device type {device_type}: parameter {param}: default_hex value {value:?} is not a valid hex number")]
    InvalidDefaultHex {
        device_type: String,
        param: u32,
        value: String,
    },

    /// Node defined twice
    #[error("node {0} is present multiple times in config")]
    DuplicateNode(u32),

    /// Node references an unknown device type
    #[error("node {node}: device type {device_type} is not defined")]
    UndefinedDeviceType { node: u32, device_type: String },

    /// Node parameter defined twice
    #[error("parameter {param} for node {node} is present multiple times in config")]
    DuplicateParameter { node: u32, param: u32 },

    /// Node parameter not defined by its device type
    #[error("parameter {param} for node {node} is not defined in device type {device_type}")]
    UndefinedParameter {
        node: u32,
        param: u32,
        device_type: String,
    },

    /// Both `value` and `value_hex`
    #[error("parameter {param} for node {node} has both value and value_hex")]
    ConflictingValue { node: u32, param: u32 },

    /// Malformed `value_hex`
    #[error("parameter {param} for node {node}: value_hex {value:?} is not a valid hex number")]
    InvalidValueHex { node: u32, param: u32, value: String },

    /// Neither an explicit value nor an inherited default
    #[error("parameter {param} for node {node} has no value in config")]
    MissingValue { node: u32, param: u32 },

    /// Schedule time that is not HH:MM:SS
    #[error("node {node}: failed to parse schedule time {value:?}")]
    InvalidTime { node: u32, value: String },

    /// Schedule with no events
    #[error("node {0}: schedule is empty")]
    EmptySchedule(u32),

    /// Schedule together with parameters or a device type
    #[error("node {0}: a node has either a schedule or parameters, not both")]
    MixedModes(u32),

    /// Parameter node that ends up with no parameters
    #[error("node {0}: no parameters, device type defaults or schedule to maintain")]
    NothingToMaintain(u32),

    /// Actuator on a parameter node
    #[error("node {0}: actuator is only valid for scheduled nodes")]
    ActuatorWithoutSchedule(u32),
}
