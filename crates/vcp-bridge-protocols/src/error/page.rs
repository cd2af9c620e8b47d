//! Browsing context errors.

use thiserror::Error;

/// Errors raised while serializing or driving a page.
///
/// The display strings are sent verbatim to the automation server inside
/// `command_result.error`, so they name the offending target.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("未能在页面上找到目标为 '{0}' 的元素。")]
    TargetNotFound(String),

    #[error("目标 '{0}' 的元素不是一个输入框。")]
    NotEditable(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Page closed")]
    Closed,
}
