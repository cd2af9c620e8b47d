//! Render-tree abstraction.
//!
//! The serializer and executor never touch a browser directly. They read a
//! [`RenderTree`] (node kinds, composed children, computed style) and write
//! through [`DomWrite`]. [`MemoryDom`] implements both, either built by hand
//! in tests or rebuilt from a [`DomSnapshot`] captured in a live page.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

mod memory;
mod snapshot;
mod style;

pub use memory::{el, DomEvent, ElementSpec, Listener, MemoryDom, NodeSpec};
pub use snapshot::{DomSnapshot, SnapshotKind, SnapshotNode, SnapshotStyle};
pub use style::{ComputedStyle, Display, Visibility};

/// Index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Document,
    ShadowRoot,
    /// Element with its lowercase tag name.
    Element { tag: &'a str },
    Text(&'a str),
}

impl<'a> NodeKind<'a> {
    pub fn tag(&self) -> Option<&'a str> {
        match self {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }
}

/// Read side of a page.
pub trait RenderTree {
    fn root(&self) -> NodeId;

    fn title(&self) -> &str;

    fn kind(&self, node: NodeId) -> Result<NodeKind<'_>, TreeError>;

    /// Composed parent: a shadow root reports its host.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Light-DOM children in document order.
    fn children(&self, node: NodeId) -> &[NodeId];

    fn shadow_root(&self, node: NodeId) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, TreeError>;

    /// Live form value for input/textarea/select.
    fn value(&self, node: NodeId) -> Option<&str>;

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.kind(node).ok().and_then(|k| k.tag())
    }

    fn body(&self) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.tag(n) == Some("body"))
    }

    /// Pre-order walk below `node`, entering shadow roots before light
    /// children.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current != node {
                out.push(current);
            }
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
            if let Some(shadow) = self.shadow_root(current) {
                stack.push(shadow);
            }
        }
        out
    }

    /// Children as rendered: a shadow host renders its shadow root, and a
    /// `<slot>` renders the host children assigned to it (or its fallback
    /// content when nothing is assigned).
    fn composed_children(&self, node: NodeId) -> Vec<NodeId> {
        if let Some(shadow) = self.shadow_root(node) {
            return vec![shadow];
        }
        if self.tag(node) == Some("slot") {
            if let Some(host) = self.shadow_host_of(node) {
                let name = self.attribute(node, "name").unwrap_or("");
                let assigned: Vec<NodeId> = self
                    .children(host)
                    .iter()
                    .copied()
                    .filter(|&c| match self.kind(c) {
                        Ok(NodeKind::Element { .. }) => self.attribute(c, "slot").unwrap_or("") == name,
                        Ok(NodeKind::Text(_)) => name.is_empty(),
                        _ => false,
                    })
                    .collect();
                if !assigned.is_empty() {
                    return assigned;
                }
            }
        }
        self.children(node).to_vec()
    }

    /// Host of the shadow tree containing `node`.
    fn shadow_host_of(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if matches!(self.kind(id), Ok(NodeKind::ShadowRoot)) {
                return self.parent(id);
            }
            current = self.parent(id);
        }
        None
    }

    fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.attribute(n, name) == Some(value))
    }

    /// Elements carrying `name`, in tree order.
    fn elements_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&n| self.attribute(n, name).is_some())
            .collect()
    }
}

/// Synthetic mouse event parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventInit {
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl MouseEventInit {
    pub fn click() -> Self {
        Self {
            event_type: "click".to_string(),
            bubbles: true,
            cancelable: true,
        }
    }
}

/// Write side of a page.
pub trait DomWrite {
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), TreeError>;

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), TreeError>;

    fn focus(&mut self, node: NodeId) -> Result<(), TreeError>;

    /// Dispatch a synthetic event; returns `false` if a listener cancelled it.
    fn dispatch_mouse_event(
        &mut self,
        node: NodeId,
        init: &MouseEventInit,
    ) -> Result<bool, TreeError>;
}

/// A recorded write, replayable against the real page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DomEdit {
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveAttribute {
        node: NodeId,
        name: String,
    },
    SetValue {
        node: NodeId,
        value: String,
    },
    Focus {
        node: NodeId,
    },
    DispatchMouseEvent {
        node: NodeId,
        init: MouseEventInit,
    },
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
