//! Host platform errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("创建标签页失败: {0}")]
    Navigation(String),

    #[error("No active page")]
    NoActivePage,

    #[error("Backend error: {0}")]
    Backend(String),
}
