//! Wire protocol errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("不支持的命令: {0}")]
    UnsupportedCommand(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<url::ParseError> for ProtocolError {
    fn from(e: url::ParseError) -> Self {
        ProtocolError::InvalidEndpoint(e.to_string())
    }
}
