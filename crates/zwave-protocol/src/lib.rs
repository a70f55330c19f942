//! zwave-js server protocol implementation
//!
//! This crate implements the JSON-over-WebSocket protocol used to talk to a
//! zwave-js server: the schema handshake, request/result correlation over a
//! single connection, and delivery of unsolicited events.

pub mod commands;
pub mod message;
pub mod transport;
pub mod types;

pub use commands::{Command, CommandClass, Property, ValueId};
pub use message::{Inbound, Request, ResultMessage, ZwaveEvent};
pub use transport::{EventHandler, ZwaveTransport, DEFAULT_TIMEOUT};
pub use types::*;
