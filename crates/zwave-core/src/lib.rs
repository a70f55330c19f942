//! Z-Wave device layer
//!
//! This crate provides typed node operations (value get/set/poll, node
//! state, command class API calls) on top of the low-level zwave-js
//! session, and the `DeviceControl` seam used by the reconciliation loop.

pub mod actuator;
pub mod network;
pub mod node;

pub use actuator::Actuator;
pub use network::{DeviceControl, NetworkError, ReadMode, ZwaveNetwork};
pub use node::{NodeSnapshot, NodeStatus};
