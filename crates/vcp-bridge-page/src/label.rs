//! Element kinds and human-readable labels.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::{role_of, skip_reason};
use crate::tree::{NodeKind, NodeId, RenderTree};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// How an interactive element is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Link,
    Button,
    Input,
    TextArea,
    Select,
    Generic,
}

impl ElementKind {
    pub fn of<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let tag = tree.tag(node).unwrap_or("");
        match tag {
            "a" => return ElementKind::Link,
            "button" => return ElementKind::Button,
            "textarea" => return ElementKind::TextArea,
            "select" => return ElementKind::Select,
            "input" => {
                let input_type = tree.attribute(node, "type").unwrap_or("text");
                return match input_type.to_ascii_lowercase().as_str() {
                    "button" | "submit" | "reset" => ElementKind::Button,
                    _ => ElementKind::Input,
                };
            }
            _ => {}
        }

        match role_of(tree, node).as_deref() {
            Some("link") => ElementKind::Link,
            Some("button") => ElementKind::Button,
            Some("textbox") | Some("searchbox") => ElementKind::Input,
            Some("combobox") => ElementKind::Select,
            _ => ElementKind::Generic,
        }
    }

    /// Prefix shown inside the token.
    pub fn display_name(&self) -> &'static str {
        match self {
            ElementKind::Link => "链接",
            ElementKind::Button => "按钮",
            ElementKind::Input | ElementKind::TextArea => "输入框",
            ElementKind::Select => "下拉选择",
            ElementKind::Generic => "交互元素",
        }
    }

    fn untitled(&self) -> &'static str {
        match self {
            ElementKind::Link => "无标题链接",
            ElementKind::Button => "无标题按钮",
            ElementKind::Input | ElementKind::TextArea => "无标题输入框",
            ElementKind::Select => "无标题下拉框",
            ElementKind::Generic => "无标题元素",
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Rendered text below `node`, ignoring skipped subtrees.
pub fn visible_text<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let mut out = String::new();
    collect_text(tree, node, &mut out, 0);
    collapse_whitespace(&out)
}

fn collect_text<T: RenderTree + ?Sized>(tree: &T, node: NodeId, out: &mut String, depth: usize) {
    if depth > 256 {
        return;
    }
    for child in tree.composed_children(node) {
        match tree.kind(child) {
            Ok(NodeKind::Text(data)) => out.push_str(data),
            Ok(NodeKind::Element { .. }) => {
                if !matches!(skip_reason(tree, child), Ok(None)) {
                    continue;
                }
                let block = tree
                    .computed_style(child)
                    .map(|s| s.display.is_block_like())
                    .unwrap_or(false);
                if block {
                    out.push(' ');
                }
                collect_text(tree, child, out, depth + 1);
                if block {
                    out.push(' ');
                }
            }
            Ok(NodeKind::ShadowRoot) => collect_text(tree, child, out, depth + 1),
            _ => {}
        }
    }
}

/// Label candidates in priority order: visible text, value, placeholder,
/// aria-label, title.
pub fn candidate_text<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let text = visible_text(tree, node);
    if !text.is_empty() {
        return text;
    }

    let fallbacks = [
        tree.value(node),
        tree.attribute(node, "placeholder"),
        tree.attribute(node, "aria-label"),
        tree.attribute(node, "title"),
    ];
    fallbacks
        .into_iter()
        .flatten()
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Text of a `<label for=id>` or an enclosing `<label>`.
pub fn associated_label<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> Option<String> {
    if let Some(id) = tree.attribute(node, "id").filter(|id| !id.is_empty()) {
        let explicit = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&n| tree.tag(n) == Some("label") && tree.attribute(n, "for") == Some(id));
        if let Some(label) = explicit {
            let text = visible_text(tree, label);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    let mut current = tree.parent(node);
    while let Some(id) = current {
        if tree.tag(id) == Some("label") {
            let text = visible_text(tree, id);
            return (!text.is_empty()).then_some(text);
        }
        current = tree.parent(id);
    }
    None
}

/// Final label as rendered in the token.
pub fn display_label<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let kind = ElementKind::of(tree, node);
    let text = candidate_text(tree, node);
    if !text.is_empty() {
        return text;
    }

    let tag = tree.tag(node).unwrap_or("");
    let form_control = matches!(tag, "input" | "textarea" | "select");
    if form_control {
        if let Some(label) = associated_label(tree, node) {
            return label;
        }
        let named = ["name", "id"]
            .into_iter()
            .filter_map(|attr| tree.attribute(node, attr))
            .map(collapse_whitespace)
            .find(|s| !s.is_empty());
        if let Some(named) = named {
            return named;
        }
    }

    kind.untitled().to_string()
}

/// `[<kind>: <label>](<reference>)`
pub fn format_token(kind: ElementKind, label: &str, reference: &str) -> String {
    format!("[{}: {}]({})", kind.display_name(), label, reference)
}
