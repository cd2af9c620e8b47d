//! Wire message envelope.
//!
//! Every WebSocket frame is a JSON object discriminated by its top-level
//! `type`. Heartbeats carry their timestamp at the top level; every other
//! kind wraps its payload in `data`.

use serde::{Deserialize, Serialize};

use crate::command::{CommandEnvelope, CommandResult};
use crate::error::ProtocolError;

/// A single frame exchanged with the automation server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Liveness probe sent by the host.
    #[serde(rename = "heartbeat")]
    Heartbeat { timestamp: i64 },

    /// Server acknowledgement of a heartbeat.
    #[serde(rename = "heartbeat_ack")]
    HeartbeatAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },

    /// Whole-page snapshot pushed by the observer.
    #[serde(rename = "pageInfoUpdate")]
    PageInfoUpdate { data: PageInfo },

    /// Command issued by the server.
    #[serde(rename = "command")]
    Command { data: CommandEnvelope },

    /// Result correlated to a command by `requestId`.
    #[serde(rename = "command_result")]
    CommandResult { data: CommandResult },
}

/// Payload of a `pageInfoUpdate` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub markdown: String,
}

impl WireMessage {
    /// Heartbeat stamped with the current wall-clock time in milliseconds.
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn page_info(markdown: impl Into<String>) -> Self {
        Self::PageInfoUpdate {
            data: PageInfo {
                markdown: markdown.into(),
            },
        }
    }

    pub fn command_result(result: CommandResult) -> Self {
        Self::CommandResult { data: result }
    }

    /// Wire name of this frame, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heartbeat { .. } => "heartbeat",
            Self::HeartbeatAck { .. } => "heartbeat_ack",
            Self::PageInfoUpdate { .. } => "pageInfoUpdate",
            Self::Command { .. } => "command",
            Self::CommandResult { .. } => "command_result",
        }
    }
}

/// Serialize a frame to its JSON text form.
pub fn encode(message: &WireMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Parse a JSON text frame. Unknown `type` values and shape mismatches are
/// reported as [`ProtocolError::Malformed`].
pub fn decode(text: &str) -> Result<WireMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
