//! Computed style subset.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    None,
    Block,
    Inline,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    ListItem,
    Table,
    Contents,
    Other,
}

impl Display {
    pub fn parse(value: &str) -> Self {
        // Chrome reports multi-keyword values like "block flow" for some nodes.
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "none" => Display::None,
            "block" | "block flow" | "flow-root" => Display::Block,
            "inline" | "inline flow" => Display::Inline,
            "inline-block" => Display::InlineBlock,
            "flex" | "block flex" => Display::Flex,
            "inline-flex" => Display::InlineFlex,
            "grid" | "block grid" => Display::Grid,
            "inline-grid" => Display::InlineGrid,
            "list-item" => Display::ListItem,
            "table" => Display::Table,
            "contents" => Display::Contents,
            _ => Display::Other,
        }
    }

    /// Rendered as its own paragraph.
    pub fn is_block_like(&self) -> bool {
        matches!(
            self,
            Display::Block | Display::Flex | Display::Grid | Display::ListItem
        )
    }

    /// Initial display for a tag when no style says otherwise.
    pub fn default_for_tag(tag: &str) -> Self {
        match tag {
            "head" | "script" | "style" | "template" | "title" | "meta" | "link" | "noscript" => {
                Display::None
            }
            "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer"
            | "main" | "nav" | "aside" | "form" | "ul" | "ol" | "dl" | "dd" | "dt"
            | "blockquote" | "pre" | "figure" | "fieldset" | "h1" | "h2" | "h3" | "h4"
            | "h5" | "h6" | "hr" | "address" | "details" | "summary" => Display::Block,
            "li" => Display::ListItem,
            "table" => Display::Table,
            "button" | "input" | "select" | "textarea" | "img" => Display::InlineBlock,
            "slot" => Display::Contents,
            _ => Display::Inline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hidden" => Visibility::Hidden,
            "collapse" => Visibility::Collapse,
            _ => Visibility::Visible,
        }
    }
}

/// The style properties the classifier looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub opacity: f32,
    pub cursor: String,
    /// Layout size; `None` when the backend has no layout information.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ComputedStyle {
    /// Parse CSS opacity, treating garbage as fully opaque.
    pub fn parse_opacity(value: &str) -> f32 {
        value.trim().parse::<f32>().unwrap_or(1.0)
    }

    pub fn is_zero_size(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if w <= 0.0 && h <= 0.0)
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            visibility: Visibility::Visible,
            opacity: 1.0,
            cursor: "auto".to_string(),
            width: None,
            height: None,
        }
    }
}
