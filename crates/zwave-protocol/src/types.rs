//! Common types used throughout the protocol

use serde::Deserialize;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid request parameters: {0}")]
    InvalidParams(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Timed out waiting for response to {command} (message {message_id})")]
    Timeout { command: String, message_id: u64 },

    #[error("Server rejected {command}: {error_code} {details}")]
    Rejected {
        command: String,
        error_code: String,
        details: String,
    },

    #[error("Event received with no event handler registered")]
    UnhandledEvent,

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Transport not connected")]
    NotConnected,
}

/// Version banner sent by the server before it accepts any request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    #[serde(default)]
    pub driver_version: Option<String>,
    #[serde(default)]
    pub server_version: Option<String>,
    #[serde(default)]
    pub home_id: Option<u64>,
    #[serde(default)]
    pub min_schema_version: Option<u32>,
    pub max_schema_version: u32,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "server {} driver {} schema {}",
            self.server_version.as_deref().unwrap_or("?"),
            self.driver_version.as_deref().unwrap_or("?"),
            self.max_schema_version
        )?;
        if let Some(home_id) = self.home_id {
            write!(f, " home {home_id:#010x}")?;
        }
        Ok(())
    }
}
