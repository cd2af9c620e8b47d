//! Flat DOM snapshots captured from a live page.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

use super::memory::{ElementData, MemoryDom, NodeData, StyleDecl};
use super::{ComputedStyle, Display, NodeId, Visibility};

/// Pre-order node list. Index `i` becomes `NodeId(i)`; index 0 is the
/// document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub title: String,
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    Document,
    Element,
    Text,
    ShadowRoot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub kind: SnapshotKind,
    /// Index of the parent (the host, for shadow roots).
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub style: Option<SnapshotStyle>,
}

/// Raw computed style strings as reported by `getComputedStyle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub cursor: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl From<&SnapshotStyle> for ComputedStyle {
    fn from(raw: &SnapshotStyle) -> Self {
        ComputedStyle {
            display: Display::parse(&raw.display),
            visibility: Visibility::parse(&raw.visibility),
            opacity: ComputedStyle::parse_opacity(&raw.opacity),
            cursor: raw.cursor.trim().to_ascii_lowercase(),
            width: raw.width,
            height: raw.height,
        }
    }
}

impl MemoryDom {
    /// Rebuild a tree from a snapshot, keeping node indices as ids.
    pub fn from_snapshot(snapshot: &DomSnapshot) -> Result<Self, TreeError> {
        let mut dom = MemoryDom::empty(&snapshot.title);

        for (index, node) in snapshot.nodes.iter().enumerate() {
            if index == 0 {
                if node.kind != SnapshotKind::Document {
                    return Err(TreeError::NotElement(NodeId(0)));
                }
                continue;
            }

            let parent = match node.parent {
                Some(p) if p < index => Some(NodeId(p)),
                Some(p) => return Err(TreeError::UnknownNode(NodeId(p))),
                None => None,
            };

            let data = match node.kind {
                SnapshotKind::Document => return Err(TreeError::NotElement(NodeId(index))),
                SnapshotKind::ShadowRoot => NodeData::ShadowRoot,
                SnapshotKind::Text => NodeData::Text(node.text.clone().unwrap_or_default()),
                SnapshotKind::Element => NodeData::Element(ElementData {
                    tag: node
                        .tag
                        .as_deref()
                        .unwrap_or("unknown")
                        .to_ascii_lowercase(),
                    attrs: node.attrs.clone(),
                    value: node.value.clone(),
                    style: resolved_style(node.style.as_ref()),
                }),
            };

            dom.push(data, parent, node.kind == SnapshotKind::ShadowRoot);
        }

        Ok(dom)
    }
}

/// Snapshot styles are already computed, so every field is set explicitly
/// and nothing is inherited again.
fn resolved_style(raw: Option<&SnapshotStyle>) -> StyleDecl {
    match raw {
        Some(raw) => {
            let style = ComputedStyle::from(raw);
            StyleDecl {
                display: Some(style.display),
                visibility: Some(style.visibility),
                opacity: Some(style.opacity),
                cursor: Some(style.cursor),
                width: style.width,
                height: style.height,
                unavailable: None,
            }
        }
        None => StyleDecl {
            unavailable: Some("not captured".to_string()),
            ..StyleDecl::default()
        },
    }
}
