//! Connection lifecycle configuration (heartbeat, reconnect).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::default_true;

/// Heartbeat settings for the observer channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Seconds between heartbeat frames.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Unanswered heartbeats tolerated before the socket is closed.
    /// `0` disables the check.
    #[serde(default)]
    pub missed_heartbeat_limit: u32,

    /// Outbound frame queue capacity.
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_send_buffer() -> usize {
    100
}

impl ConnectionConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            missed_heartbeat_limit: 0,
            send_buffer: default_send_buffer(),
        }
    }
}

/// Automatic reconnection after an unexpected close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

impl ReconnectConfig {
    /// Backoff delay before the given attempt (0-based), doubling up to the cap.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(32)).unwrap_or(u64::MAX);
        let ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}
