//! Connection errors.

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use vcp_bridge_protocols::ProtocolError;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[source] ProtocolError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Not connected")]
    NotConnected,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
