//! Node classification: skip, recurse, or treat as an interactive unit.

use crate::error::TreeError;
use crate::tree::{ComputedStyle, Display, NodeKind, NodeId, RenderTree, Visibility};

/// Tags whose subtree never contributes to the snapshot.
const DENY_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "aside", "iframe", "noscript", "head", "template",
];

const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select", "option"];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "menuitem", "tab", "switch", "option", "treeitem",
    "searchbox", "textbox", "combobox",
];

/// Why a node was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DisplayNone,
    VisibilityHidden,
    Transparent,
    ZeroSize,
    DeniedTag,
    HiddenInput,
}

/// Skip rules, evaluated before anything else.
pub fn should_skip(tag: &str, style: &ComputedStyle, input_type: Option<&str>) -> Option<SkipReason> {
    if style.display == Display::None {
        return Some(SkipReason::DisplayNone);
    }
    if style.visibility == Visibility::Hidden {
        return Some(SkipReason::VisibilityHidden);
    }
    if style.opacity <= 0.0 {
        return Some(SkipReason::Transparent);
    }
    // `display: contents` boxes always measure 0x0; their children still render.
    if style.display != Display::Contents && style.is_zero_size() {
        return Some(SkipReason::ZeroSize);
    }
    if DENY_TAGS.contains(&tag) {
        return Some(SkipReason::DeniedTag);
    }
    if tag == "input" && input_type.is_some_and(|t| t.eq_ignore_ascii_case("hidden")) {
        return Some(SkipReason::HiddenInput);
    }
    None
}

/// Skip check for an element node of `tree`.
pub fn skip_reason<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> Result<Option<SkipReason>, TreeError> {
    let tag = tree.tag(node).ok_or(TreeError::NotElement(node))?;
    let style = tree.computed_style(node)?;
    Ok(should_skip(tag, &style, tree.attribute(node, "type")))
}

/// First token of the `role` attribute, lowercased.
pub fn role_of<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> Option<String> {
    tree.attribute(node, "role")
        .and_then(|r| r.split_whitespace().next())
        .map(|r| r.to_ascii_lowercase())
}

/// Whether an element is an opaque interactive unit.
pub fn is_interactive<T: RenderTree + ?Sized>(tree: &T, node: NodeId, style: &ComputedStyle) -> bool {
    let Some(tag) = tree.tag(node) else {
        return false;
    };

    if INTERACTIVE_TAGS.contains(&tag) {
        return true;
    }

    let role = role_of(tree, node);
    if role
        .as_deref()
        .is_some_and(|r| INTERACTIVE_ROLES.contains(&r))
    {
        return true;
    }

    if tree.attribute(node, "onclick").is_some() {
        return true;
    }

    if tree
        .attribute(node, "tabindex")
        .and_then(|t| t.trim().parse::<i32>().ok())
        .is_some_and(|t| t >= 0)
    {
        return true;
    }

    if style.cursor == "pointer" {
        if tag == "html" || tag == "body" {
            return false;
        }
        // Pointer cursor inherited by a wrapper is not a signal on its own.
        let wrapper = own_text(tree, node).is_empty() && !tree.children(node).is_empty();
        if wrapper && tree.attribute(node, "role").is_none() {
            return false;
        }
        return true;
    }

    false
}

/// Concatenated direct text children, trimmed.
fn own_text<T: RenderTree + ?Sized>(tree: &T, node: NodeId) -> String {
    let mut text = String::new();
    for &child in tree.children(node) {
        if let Ok(NodeKind::Text(data)) = tree.kind(child) {
            text.push_str(data);
        }
    }
    text.trim().to_string()
}
