//! Page-side configuration (observer cadence, browser backend).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Snapshot scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Quiet period after the last mutation before a snapshot is taken.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Unconditional snapshot cadence.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Delay between a completed action and its follow-up snapshot.
    #[serde(default = "default_post_action_delay")]
    pub post_action_delay_ms: u64,
}

fn default_debounce() -> u64 {
    500
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_post_action_delay() -> u64 {
    500
}

impl ObserverConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn post_action_delay(&self) -> Duration {
        Duration::from_millis(self.post_action_delay_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
            poll_interval_ms: default_poll_interval(),
            post_action_delay_ms: default_post_action_delay(),
        }
    }
}

/// Chrome DevTools backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// HTTP endpoint of a Chrome started with `--remote-debugging-port`.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,

    /// Per-call timeout for DevTools requests.
    #[serde(default = "default_cdp_timeout")]
    pub command_timeout_ms: u64,
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_cdp_timeout() -> u64 {
    30_000
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
            command_timeout_ms: default_cdp_timeout(),
        }
    }
}
