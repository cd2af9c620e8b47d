//! # vcp-bridge Config
//!
//! Configuration management for the vcp-bridge host process, plus the small
//! key/value settings store the connection toggle reads its endpoint from.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::{
    FileSettingsStore, MemorySettingsStore, SettingsStore, DEFAULT_SERVER_URL, DEFAULT_VCP_KEY,
    KEY_SERVER_URL, KEY_VCP_KEY,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
