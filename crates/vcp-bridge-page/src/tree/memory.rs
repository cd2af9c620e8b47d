//! Arena-backed DOM.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use crate::error::TreeError;

use super::{
    ComputedStyle, Display, DomEdit, DomWrite, MouseEventInit, NodeId, NodeKind, RenderTree,
    Visibility,
};

/// Event listener callback.
pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Event delivered to listeners.
#[derive(Debug)]
pub struct DomEvent {
    pub event_type: String,
    pub target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Declared (not yet resolved) style.
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleDecl {
    pub(crate) display: Option<Display>,
    pub(crate) visibility: Option<Visibility>,
    pub(crate) opacity: Option<f32>,
    pub(crate) cursor: Option<String>,
    pub(crate) width: Option<f64>,
    pub(crate) height: Option<f64>,
    pub(crate) unavailable: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) value: Option<String>,
    pub(crate) style: StyleDecl,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    ShadowRoot,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
}

/// Declarative node description.
pub enum NodeSpec {
    Element(ElementSpec),
    Text(String),
}

impl From<ElementSpec> for NodeSpec {
    fn from(spec: ElementSpec) -> Self {
        NodeSpec::Element(spec)
    }
}

impl From<&str> for NodeSpec {
    fn from(text: &str) -> Self {
        NodeSpec::Text(text.to_string())
    }
}

impl From<String> for NodeSpec {
    fn from(text: String) -> Self {
        NodeSpec::Text(text)
    }
}

/// Element builder.
pub struct ElementSpec {
    tag: String,
    attrs: Vec<(String, String)>,
    value: Option<String>,
    style: StyleDecl,
    children: Vec<NodeSpec>,
    shadow: Option<Vec<NodeSpec>>,
    listeners: Vec<(String, Listener)>,
}

/// Start building an element.
pub fn el(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_ascii_lowercase(),
        attrs: Vec::new(),
        value: None,
        style: StyleDecl::default(),
        children: Vec::new(),
        shadow: None,
        listeners: Vec::new(),
    }
}

impl ElementSpec {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn role(self, role: &str) -> Self {
        self.attr("role", role)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(NodeSpec::Text(text.to_string()));
        self
    }

    pub fn child(mut self, child: impl Into<NodeSpec>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<NodeSpec>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Attach an open shadow root with the given content.
    pub fn shadow<I, C>(mut self, content: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<NodeSpec>,
    {
        self.shadow = Some(content.into_iter().map(Into::into).collect());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn display(mut self, display: Display) -> Self {
        self.style.display = Some(display);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.style.visibility = Some(visibility);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.style.opacity = Some(opacity);
        self
    }

    pub fn cursor(mut self, cursor: &str) -> Self {
        self.style.cursor = Some(cursor.to_string());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.style.width = Some(width);
        self.style.height = Some(height);
        self
    }

    /// Make `computed_style` fail for this element.
    pub fn style_unavailable(mut self, reason: &str) -> Self {
        self.style.unavailable = Some(reason.to_string());
        self
    }

    pub fn on<F>(mut self, event_type: &str, listener: F) -> Self
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        self.listeners
            .push((event_type.to_string(), Arc::new(listener)));
        self
    }
}

/// In-memory DOM implementing [`RenderTree`] and [`DomWrite`].
pub struct MemoryDom {
    nodes: Vec<Node>,
    title: String,
    focused: Option<NodeId>,
    listeners: Vec<(NodeId, String, Listener)>,
    journal: Option<Vec<DomEdit>>,
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("title", &self.title)
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MemoryDom {
    /// A document with only a root node.
    pub(crate) fn empty(title: &str) -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
                shadow_root: None,
            }],
            title: title.to_string(),
            focused: None,
            listeners: Vec::new(),
            journal: None,
        }
    }

    /// `<html><body>…</body></html>` with the given body content.
    pub fn page<I, C>(title: &str, body: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<NodeSpec>,
    {
        let mut dom = Self::empty(title);
        let root = dom.root();
        let html = dom.push(NodeData::Element(element_data("html")), Some(root), false);
        let body_id = dom.push(NodeData::Element(element_data("body")), Some(html), false);
        for spec in body {
            dom.build(body_id, spec.into());
        }
        dom
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Append a subtree under `parent`.
    pub fn append(&mut self, parent: NodeId, spec: impl Into<NodeSpec>) -> Result<NodeId, TreeError> {
        self.node(parent)?;
        Ok(self.build(parent, spec.into()))
    }

    /// Detach `node` from its parent. The arena slot stays allocated.
    pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            let p = &mut self.nodes[parent.0];
            p.children.retain(|&c| c != node);
            if p.shadow_root == Some(node) {
                p.shadow_root = None;
            }
        }
        self.nodes[node.0].parent = None;
        Ok(())
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(data) => {
                *data = text.to_string();
                Ok(())
            }
            _ => Err(TreeError::NotText(node)),
        }
    }

    pub fn set_display(&mut self, node: NodeId, display: Display) -> Result<(), TreeError> {
        self.element_mut(node)?.style.display = Some(display);
        Ok(())
    }

    pub fn add_event_listener<F>(&mut self, node: NodeId, event_type: &str, listener: F) -> Result<(), TreeError>
    where
        F: Fn(&DomEvent) + Send + Sync + 'static,
    {
        self.node(node)?;
        self.listeners
            .push((node, event_type.to_string(), Arc::new(listener)));
        Ok(())
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    /// Start journaling writes.
    pub fn record_edits(&mut self) {
        if self.journal.is_none() {
            self.journal = Some(Vec::new());
        }
    }

    /// Drain journaled writes.
    pub fn take_edits(&mut self) -> Vec<DomEdit> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn push(&mut self, data: NodeData, parent: Option<NodeId>, as_shadow: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            shadow_root: None,
        });
        if let Some(parent) = parent {
            let p = &mut self.nodes[parent.0];
            if as_shadow {
                p.shadow_root = Some(id);
            } else {
                p.children.push(id);
            }
        }
        id
    }

    fn build(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text(text) => self.push(NodeData::Text(text), Some(parent), false),
            NodeSpec::Element(spec) => {
                let data = ElementData {
                    tag: spec.tag,
                    attrs: spec.attrs,
                    value: spec.value,
                    style: spec.style,
                };
                let id = self.push(NodeData::Element(data), Some(parent), false);
                for (event_type, listener) in spec.listeners {
                    self.listeners.push((id, event_type, listener));
                }
                if let Some(content) = spec.shadow {
                    let shadow = self.push(NodeData::ShadowRoot, Some(id), true);
                    for child in content {
                        self.build(shadow, child);
                    }
                }
                for child in spec.children {
                    self.build(id, child);
                }
                id
            }
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, TreeError> {
        match &self.node(id)?.data {
            NodeData::Element(data) => Ok(data),
            _ => Err(TreeError::NotElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, TreeError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(data) => Ok(data),
            _ => Err(TreeError::NotElement(id)),
        }
    }

    /// Walk composed ancestors for the first declared value.
    fn inherited<T>(&self, node: NodeId, pick: impl Fn(&StyleDecl) -> Option<T>) -> Option<T> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if let Ok(data) = self.element(id) {
                if let Some(v) = pick(&data.style) {
                    return Some(v);
                }
            }
            current = self.parent(id);
        }
        None
    }

    fn journal(&mut self, edit: DomEdit) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(edit);
        }
    }
}

fn element_data(tag: &str) -> ElementData {
    ElementData {
        tag: tag.to_string(),
        attrs: Vec::new(),
        value: None,
        style: StyleDecl::default(),
    }
}

impl RenderTree for MemoryDom {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind<'_>, TreeError> {
        Ok(match &self.node(node)?.data {
            NodeData::Document => NodeKind::Document,
            NodeData::ShadowRoot => NodeKind::ShadowRoot,
            NodeData::Element(data) => NodeKind::Element { tag: &data.tag },
            NodeData::Text(text) => NodeKind::Text(text),
        })
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.shadow_root)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        let data = self.element(node).ok()?;
        data.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, TreeError> {
        let data = self.element(node)?;
        let decl = &data.style;
        if let Some(reason) = &decl.unavailable {
            return Err(TreeError::StyleUnavailable {
                node,
                reason: reason.clone(),
            });
        }

        Ok(ComputedStyle {
            display: decl
                .display
                .unwrap_or_else(|| Display::default_for_tag(&data.tag)),
            visibility: decl
                .visibility
                .or_else(|| self.inherited(node, |s| s.visibility))
                .unwrap_or(Visibility::Visible),
            opacity: decl.opacity.unwrap_or(1.0),
            cursor: decl
                .cursor
                .clone()
                .or_else(|| self.inherited(node, |s| s.cursor.clone()))
                .unwrap_or_else(|| "auto".to_string()),
            width: decl.width,
            height: decl.height,
        })
    }

    fn value(&self, node: NodeId) -> Option<&str> {
        let data = self.element(node).ok()?;
        data.value
            .as_deref()
            .or_else(|| self.attribute(node, "value"))
    }
}

impl DomWrite for MemoryDom {
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let data = self.element_mut(node)?;
        match data.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
        self.journal(DomEdit::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), TreeError> {
        self.element_mut(node)?.attrs.retain(|(k, _)| k != name);
        self.journal(DomEdit::RemoveAttribute {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), TreeError> {
        self.element_mut(node)?.value = Some(value.to_string());
        self.journal(DomEdit::SetValue {
            node,
            value: value.to_string(),
        });
        Ok(())
    }

    fn focus(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.element(node)?;
        self.focused = Some(node);
        self.journal(DomEdit::Focus { node });
        Ok(())
    }

    fn dispatch_mouse_event(&mut self, node: NodeId, init: &MouseEventInit) -> Result<bool, TreeError> {
        self.element(node)?;
        self.journal(DomEdit::DispatchMouseEvent {
            node,
            init: init.clone(),
        });

        let event = DomEvent {
            event_type: init.event_type.clone(),
            target: node,
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            current_target: Cell::new(node),
            default_prevented: Cell::new(false),
        };

        let mut current = Some(node);
        while let Some(id) = current {
            event.current_target.set(id);
            for (_, _, listener) in self
                .listeners
                .iter()
                .filter(|(n, t, _)| *n == id && *t == init.event_type)
            {
                listener(&event);
            }
            if !init.bubbles {
                break;
            }
            current = self.parent(id);
        }

        Ok(!event.default_prevented())
    }
}
