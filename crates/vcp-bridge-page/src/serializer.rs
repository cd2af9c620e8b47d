//! Page to Markdown serialization.
//!
//! A pass wipes every previous `vcp-id`, walks the composed tree from
//! `<body>`, emits text and one `[<kind>: <label>](vcp-id-N)` token per
//! interactive element, and finally stamps the new references. Numbering
//! follows tree order, so two passes over an unchanged tree are identical.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::classify::{is_interactive, should_skip};
use crate::error::SerializeError;
use crate::label::{collapse_whitespace, display_label, format_token, ElementKind};
use crate::tree::{DomWrite, NodeId, NodeKind, RenderTree};
use crate::VCP_ID_ATTR;

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));
static SPACE_AROUND_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r" *\n *").expect("valid regex"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Default maximum nesting depth of a pass.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Result of a read-only walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub markdown: String,
    /// References to stamp, in assignment order.
    pub stamps: Vec<(NodeId, String)>,
}

#[derive(Debug, Clone)]
pub struct PageSerializer {
    max_depth: usize,
}

impl Default for PageSerializer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl PageSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Full pass: wipe old references, render, stamp new references.
    ///
    /// Never fails; a failed pass yields a minimal page carrying the error.
    pub fn serialize<T: RenderTree + DomWrite>(&self, dom: &mut T) -> String {
        let stale: Vec<NodeId> = dom.elements_with_attribute(VCP_ID_ATTR);
        for node in stale {
            if let Err(e) = dom.remove_attribute(node, VCP_ID_ATTR) {
                warn!("Failed to clear stale reference on {}: {}", node, e);
            }
        }

        match self.render(&*dom) {
            Ok(rendered) => {
                for (node, reference) in &rendered.stamps {
                    if let Err(e) = dom.set_attribute(*node, VCP_ID_ATTR, reference) {
                        warn!("Failed to stamp {} on {}: {}", reference, node, e);
                    }
                }
                debug!(
                    "Serialized page: {} chars, {} interactive elements",
                    rendered.markdown.len(),
                    rendered.stamps.len()
                );
                rendered.markdown
            }
            Err(e) => {
                warn!("Page serialization failed: {}", e);
                normalize(&format!("{}[页面处理错误: {}]", header(dom.title()), e))
            }
        }
    }

    /// Read-only walk producing Markdown and the references to stamp.
    pub fn render<T: RenderTree + ?Sized>(&self, tree: &T) -> Result<Rendered, SerializeError> {
        let body = tree.body().ok_or(SerializeError::NoBody)?;
        let mut pass = Pass {
            tree,
            max_depth: self.max_depth,
            stamps: Vec::new(),
        };
        let content = pass.children(body, 0)?;
        let markdown = normalize(&format!("{}{}", header(tree.title()), content));
        Ok(Rendered {
            markdown,
            stamps: pass.stamps,
        })
    }
}

struct Pass<'a, T: ?Sized> {
    tree: &'a T,
    max_depth: usize,
    stamps: Vec<(NodeId, String)>,
}

impl<T: RenderTree + ?Sized> Pass<'_, T> {
    fn children(&mut self, node: NodeId, depth: usize) -> Result<String, SerializeError> {
        let mut out = String::new();
        for child in self.tree.composed_children(node) {
            out.push_str(&self.node(child, depth + 1)?);
        }
        Ok(out)
    }

    fn node(&mut self, node: NodeId, depth: usize) -> Result<String, SerializeError> {
        if depth > self.max_depth {
            return Err(SerializeError::DepthExceeded(self.max_depth));
        }
        let tree = self.tree;

        let tag = match tree.kind(node) {
            Ok(NodeKind::Text(data)) => {
                let text = collapse_whitespace(data);
                return Ok(if text.is_empty() {
                    String::new()
                } else {
                    format!("{} ", text)
                });
            }
            Ok(NodeKind::ShadowRoot) | Ok(NodeKind::Document) => {
                return self.children(node, depth);
            }
            Ok(NodeKind::Element { tag }) => tag,
            Err(e) => return Ok(node_error(&e)),
        };

        let style = match tree.computed_style(node) {
            Ok(style) => style,
            Err(e) => return Ok(node_error(&e)),
        };

        if should_skip(tag, &style, tree.attribute(node, "type")).is_some() {
            return Ok(String::new());
        }

        if is_interactive(tree, node, &style) {
            let reference = format!("vcp-id-{}", self.stamps.len() + 1);
            let kind = ElementKind::of(tree, node);
            let label = display_label(tree, node);
            let token = format_token(kind, &label, &reference);
            self.stamps.push((node, reference));
            return Ok(format!("{}\n", token));
        }

        let inner = self.children(node, depth)?;
        if inner.trim().is_empty() {
            return Ok(inner);
        }

        if let Some(level) = heading_level(tag) {
            return Ok(format!("\n{} {}\n\n", "#".repeat(level), inner.trim()));
        }

        if style.display.is_block_like() {
            return Ok(format!("\n{}\n", inner));
        }

        Ok(inner)
    }
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn header(title: &str) -> String {
    let title = collapse_whitespace(title);
    if title.is_empty() {
        String::new()
    } else {
        format!("# {}\n\n", title)
    }
}

fn node_error(err: &dyn std::fmt::Display) -> String {
    format!("[节点处理错误: {}]", err)
}

/// Collapse space runs, strip spaces around newlines, allow at most one
/// blank line, trim.
pub fn normalize(markdown: &str) -> String {
    let s = SPACES.replace_all(markdown, " ");
    let s = SPACE_AROUND_NEWLINE.replace_all(&s, "\n");
    let s = BLANK_RUNS.replace_all(&s, "\n\n");
    s.trim().to_string()
}

#[cfg(test)]
#[path = "serializer_tests.rs"]
mod tests;
