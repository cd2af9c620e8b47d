//! Command vocabulary and results.
//!
//! Commands arrive as an open JSON object ([`CommandEnvelope`]) so that the
//! correlation fields survive even when the command itself is unknown. The
//! router then narrows it to the closed [`CommandAction`] sum type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Reserved command name handled by the host, never by a page.
pub const OPEN_URL: &str = "open_url";

/// Inbound command as received on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "requestId")]
    pub request_id: String,

    pub command: String,

    #[serde(
        rename = "sourceClientId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_client_id: Option<String>,

    /// Command-specific parameters (`target`, `text`, `url`, ...).
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Closed set of actions the bridge understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Open a new page at the given URL (host-handled).
    OpenUrl { url: String },
    /// Action executed inside the active page.
    Page(PageCommand),
}

/// Actions delegated to the browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PageCommand {
    Click { target: String },
    Type { target: String, text: String },
}

impl PageCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Type { .. } => "type",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Click { target } | Self::Type { target, .. } => target,
        }
    }
}

impl CommandEnvelope {
    pub fn new(request_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            command: command.into(),
            source_client_id: None,
            params: Map::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_source_client(mut self, id: impl Into<String>) -> Self {
        self.source_client_id = Some(id.into());
        self
    }

    /// Narrow the open envelope into a known action.
    pub fn action(&self) -> Result<CommandAction, ProtocolError> {
        match self.command.as_str() {
            OPEN_URL => Ok(CommandAction::OpenUrl {
                url: self.required_str("url")?.to_string(),
            }),
            "click" => Ok(CommandAction::Page(PageCommand::Click {
                target: self.required_str("target")?.to_string(),
            })),
            "type" => Ok(CommandAction::Page(PageCommand::Type {
                target: self.required_str("target")?.to_string(),
                text: self.text_param()?,
            })),
            other => Err(ProtocolError::UnsupportedCommand(other.to_string())),
        }
    }

    fn required_str(&self, key: &str) -> Result<&str, ProtocolError> {
        match self.params.get(key).and_then(Value::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ProtocolError::MissingField(key.to_string())),
        }
    }

    // Empty text is a legitimate way to clear a field; only absence is an error.
    fn text_param(&self) -> Result<String, ProtocolError> {
        match self.params.get("text") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(ProtocolError::MissingField("text".to_string())),
        }
    }
}

/// Outcome status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

/// Result frame payload, correlated by `requestId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(rename = "requestId")]
    pub request_id: String,

    #[serde(
        rename = "sourceClientId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_client_id: Option<String>,

    pub status: CommandStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn success(
        envelope: &CommandEnvelope,
        message: impl Into<String>,
        result: Option<Value>,
    ) -> Self {
        Self {
            request_id: envelope.request_id.clone(),
            source_client_id: envelope.source_client_id.clone(),
            status: CommandStatus::Success,
            message: Some(message.into()),
            result,
            error: None,
        }
    }

    pub fn failure(envelope: &CommandEnvelope, error: impl Into<String>) -> Self {
        Self {
            request_id: envelope.request_id.clone(),
            source_client_id: envelope.source_client_id.clone(),
            status: CommandStatus::Error,
            message: None,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
