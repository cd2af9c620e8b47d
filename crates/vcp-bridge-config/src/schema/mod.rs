//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_connection;
mod schema_page;

pub use schema_connection::*;
pub use schema_page::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Automation server endpoint.
///
/// Both fields are optional: when unset, the persisted settings store and
/// then the built-in defaults are consulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base WebSocket URL, e.g. `ws://localhost:8088`.
    #[serde(default)]
    pub url: Option<String>,

    /// Access key appended to the channel path.
    #[serde(default)]
    pub key: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files. `None` uses `~/.vcp-bridge/debug`.
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            json: false,
        }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
