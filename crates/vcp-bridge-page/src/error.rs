//! Page-side error types.

use thiserror::Error;
use vcp_bridge_protocols::PageError;

use crate::tree::NodeId;

/// Render tree access failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotElement(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("computed style unavailable for node {node}: {reason}")]
    StyleUnavailable { node: NodeId, reason: String },
}

/// Whole-pass serialization failures.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("document has no body")]
    NoBody,

    #[error("tree deeper than {0} levels")]
    DepthExceeded(usize),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Interaction failures.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("未能在页面上找到目标为 '{0}' 的元素。")]
    TargetNotFound(String),

    #[error("目标 '{0}' 的元素不是一个输入框。")]
    NotEditable(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl From<ExecuteError> for PageError {
    fn from(err: ExecuteError) -> Self {
        match err {
            ExecuteError::TargetNotFound(target) => PageError::TargetNotFound(target),
            ExecuteError::NotEditable(target) => PageError::NotEditable(target),
            ExecuteError::Tree(e) => PageError::Dom(e.to_string()),
        }
    }
}

impl From<SerializeError> for PageError {
    fn from(err: SerializeError) -> Self {
        PageError::Dom(err.to_string())
    }
}
