//! Node roster configuration
//!
//! The roster is a TOML document describing the zwave-js endpoint, optional
//! device types with parameter defaults, and the managed nodes. Loading
//! resolves device-type inheritance and validates every reference, so the
//! loop only ever sees a fully resolved [`Roster`].

use crate::error::ConfigError;
use crate::model::{Node, NodeMode, Parameter, Roster, Schedule, ScheduleEvent, SwitchState};
use crate::scheduler::Pacing;
use chrono::NaiveTime;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use zwave_core::{Actuator, ReadMode};

const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket URL of the zwave-js server
    pub endpoint: String,
    /// How live parameter values are read
    pub read_mode: ReadMode,
    pub pacing: Pacing,
    pub nodes: Roster,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    zwavejs_api_endpoint: String,
    #[serde(default)]
    read_mode: ReadMode,
    #[serde(default)]
    pacing: RawPacing,
    #[serde(default)]
    device_type: Vec<RawDeviceType>,
    #[serde(default)]
    node: Vec<RawNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPacing {
    parameter_delay_secs: Option<u64>,
    node_delay_secs: Option<u64>,
    retry_interval_secs: Option<u64>,
    idle_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeviceType {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    params: Vec<RawDeviceTypeParam>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeviceTypeParam {
    id: u32,
    description: Option<String>,
    default: Option<u32>,
    default_hex: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    id: u32,
    device_type: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    params: Vec<RawNodeParam>,
    actuator: Option<Actuator>,
    #[serde(default)]
    schedule: Option<Vec<RawScheduleEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNodeParam {
    id: u32,
    value: Option<u32>,
    value_hex: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScheduleEvent {
    at: String,
    on: bool,
}

/// Parameter definition of a device type after validation
struct DeviceTypeParam {
    description: Option<String>,
    default: Option<u32>,
}

struct DeviceType {
    params: BTreeMap<u32, DeviceTypeParam>,
}

/// Read and validate a config file
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Validate a config document
pub fn parse(text: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(text)?;

    let endpoint = raw.zwavejs_api_endpoint;
    if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
        return Err(ConfigError::InvalidEndpoint(endpoint));
    }

    let device_types = resolve_device_types(raw.device_type)?;

    let mut nodes = Roster::new();
    for raw_node in raw.node {
        let id = raw_node.id;
        if nodes.contains_key(&id) {
            return Err(ConfigError::DuplicateNode(id));
        }
        let node = resolve_node(raw_node, &device_types)?;
        nodes.insert(id, node);
    }

    Ok(Config {
        endpoint,
        read_mode: raw.read_mode,
        pacing: raw.pacing.into_pacing(),
        nodes,
    })
}

impl RawPacing {
    fn into_pacing(self) -> Pacing {
        let defaults = Pacing::default();
        let secs =
            |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_secs);
        Pacing {
            parameter_delay: secs(self.parameter_delay_secs, defaults.parameter_delay),
            node_delay: secs(self.node_delay_secs, defaults.node_delay),
            retry_interval: secs(self.retry_interval_secs, defaults.retry_interval),
            idle_interval: secs(self.idle_interval_secs, defaults.idle_interval),
        }
    }
}

fn resolve_device_types(
    raw: Vec<RawDeviceType>,
) -> Result<HashMap<String, DeviceType>, ConfigError> {
    let mut device_types = HashMap::new();

    for raw_type in raw {
        if device_types.contains_key(&raw_type.name) {
            return Err(ConfigError::DuplicateDeviceType(raw_type.name));
        }

        let mut params = BTreeMap::new();
        for p in raw_type.params {
            if params.contains_key(&p.id) {
                return Err(ConfigError::DuplicateDeviceTypeParam {
                    device_type: raw_type.name,
                    param: p.id,
                });
            }
            let default = match (p.default, p.default_hex) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::ConflictingDefault {
                        device_type: raw_type.name,
                        param: p.id,
                    });
                }
                (Some(v), None) => Some(v),
                (None, Some(hex)) => match parse_hex(&hex) {
                    Some(v) => Some(v),
                    None => {
                        return Err(ConfigError::InvalidDefaultHex {
                            device_type: raw_type.name,
                            param: p.id,
                            value: hex,
                        });
                    }
                },
                (None, None) => None,
            };
            params.insert(
                p.id,
                DeviceTypeParam {
                    description: p.description,
                    default,
                },
            );
        }

        tracing::debug!(
            "Device type {} ({}) defines {} parameters",
            raw_type.name,
            raw_type.description,
            params.len()
        );
        device_types.insert(raw_type.name, DeviceType { params });
    }

    Ok(device_types)
}

fn resolve_node(
    raw: RawNode,
    device_types: &HashMap<String, DeviceType>,
) -> Result<Node, ConfigError> {
    let id = raw.id;

    let mode = match raw.schedule {
        Some(events) => {
            if !raw.params.is_empty() || raw.device_type.is_some() {
                return Err(ConfigError::MixedModes(id));
            }
            NodeMode::Schedule {
                schedule: resolve_schedule(id, events)?,
                actuator: raw.actuator.unwrap_or_default(),
            }
        }
        None => {
            if raw.actuator.is_some() {
                return Err(ConfigError::ActuatorWithoutSchedule(id));
            }
            let device_type = match raw.device_type.as_deref() {
                Some(name) => match device_types.get(name) {
                    Some(dt) => Some((name, dt)),
                    None => {
                        return Err(ConfigError::UndefinedDeviceType {
                            node: id,
                            device_type: name.to_string(),
                        });
                    }
                },
                None => None,
            };
            let params = resolve_params(id, raw.params, device_type)?;
            if params.is_empty() {
                return Err(ConfigError::NothingToMaintain(id));
            }
            NodeMode::Parameters(params)
        }
    };

    Ok(Node {
        id,
        description: raw.description,
        mode,
    })
}

fn resolve_params(
    node: u32,
    raw: Vec<RawNodeParam>,
    device_type: Option<(&str, &DeviceType)>,
) -> Result<BTreeMap<u32, Parameter>, ConfigError> {
    let mut params = BTreeMap::new();

    for p in raw {
        if params.contains_key(&p.id) {
            return Err(ConfigError::DuplicateParameter { node, param: p.id });
        }

        let definition = match device_type {
            Some((name, dt)) => match dt.params.get(&p.id) {
                Some(definition) => Some(definition),
                None => {
                    return Err(ConfigError::UndefinedParameter {
                        node,
                        param: p.id,
                        device_type: name.to_string(),
                    });
                }
            },
            None => None,
        };

        let value = match (p.value, p.value_hex) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingValue { node, param: p.id }),
            (Some(v), None) => v,
            (None, Some(hex)) => parse_hex(&hex).ok_or(ConfigError::InvalidValueHex {
                node,
                param: p.id,
                value: hex,
            })?,
            (None, None) => definition
                .and_then(|d| d.default)
                .ok_or(ConfigError::MissingValue { node, param: p.id })?,
        };

        let description = p
            .description
            .or_else(|| definition.and_then(|d| d.description.clone()));
        params.insert(
            p.id,
            Parameter {
                id: p.id,
                description,
                value,
            },
        );
    }

    // Inherit defaults the node does not override
    if let Some((_, dt)) = device_type {
        for (param_id, definition) in &dt.params {
            if params.contains_key(param_id) {
                continue;
            }
            if let Some(value) = definition.default {
                params.insert(
                    *param_id,
                    Parameter {
                        id: *param_id,
                        description: definition.description.clone(),
                        value,
                    },
                );
            }
        }
    }

    Ok(params)
}

fn resolve_schedule(node: u32, raw: Vec<RawScheduleEvent>) -> Result<Schedule, ConfigError> {
    let events = raw
        .into_iter()
        .map(|e| {
            NaiveTime::parse_from_str(&e.at, TIME_FORMAT)
                .map(|at| ScheduleEvent {
                    at,
                    state: SwitchState::from(e.on),
                })
                .map_err(|_| ConfigError::InvalidTime { node, value: e.at })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Schedule::new(events).ok_or(ConfigError::EmptySchedule(node))
}

/// Strict hexadecimal: digits only, no `0x` prefix or sign
fn parse_hex(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}
