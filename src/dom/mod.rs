// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document tree capability.
//!
//! The audit engine never reaches for a global document. Everything it needs
//! (structure, attributes, rendered text, computed style, geometry) comes
//! through [`DocumentTree`], and live changes come through
//! [`MutationSource`]. [`Document`] is the in-process implementation built
//! from HTML; hosts with a real rendering engine provide their own.

mod document;
mod style;

pub use document::{Document, SharedDocument};
pub use style::normalize_color;

use crate::color::Color;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

/// Opaque handle to a node in a document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rendered box size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect { width: 0.0, height: 0.0 };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Computed `visibility`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

/// Computed `display`, reduced to the outer display types the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    #[default]
    Inline,
    Block,
    InlineBlock,
    Flex,
    Grid,
    Table,
    Contents,
    None,
}

impl Display {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Some(match value.as_str() {
            "none" => Display::None,
            "inline" => Display::Inline,
            "block" | "list-item" | "flow-root" => Display::Block,
            "inline-block" | "inline-flex" | "inline-grid" | "inline-table" => Display::InlineBlock,
            "flex" => Display::Flex,
            "grid" => Display::Grid,
            "contents" => Display::Contents,
            v if v.starts_with("table") => Display::Table,
            _ => return None,
        })
    }
}

/// Computed visual style of one element, as read at the accessor boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub text_color: Color,
    pub background_color: Color,
    /// Background painted by an image or gradient, or clipped to the text
    pub background_is_image_or_gradient: bool,
    pub opacity: f64,
    pub visibility: Visibility,
    pub display: Display,
    pub font_size_px: f64,
    pub font_weight: u16,
    /// Element or an ancestor has `aria-hidden="true"`
    pub aria_hidden: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            text_color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            background_is_image_or_gradient: false,
            opacity: 1.0,
            visibility: Visibility::Visible,
            display: Display::Inline,
            font_size_px: 16.0,
            font_weight: 400,
            aria_hidden: false,
        }
    }
}

/// Read-only access to a rendered document tree.
///
/// Only element nodes are exposed; text is reachable through
/// [`DocumentTree::text_content`].
pub trait DocumentTree {
    /// The document element (`<html>`)
    fn root(&self) -> NodeId;

    /// The `<body>` element, if the document has one
    fn body(&self) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name
    fn tag_name(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Rendered text of the element and its descendants
    fn text_content(&self, node: NodeId) -> String;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle>;

    fn bounding_box(&self, node: NodeId) -> Result<Rect>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Ancestors from the parent outwards
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(n) = current {
            out.push(n);
            current = self.parent(n);
        }
        out
    }

    /// Whether `node` is `ancestor` or lies beneath it
    fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// Descendant elements in document order, excluding `node` itself
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).into_iter().rev());
        }
        out
    }

    /// Every element carrying one of `tags`, in document order
    fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeId> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&n| tags.contains(&self.tag_name(n).as_str()))
            .collect()
    }
}

impl<T: DocumentTree + ?Sized> DocumentTree for &T {
    fn root(&self) -> NodeId {
        (**self).root()
    }
    fn body(&self) -> Option<NodeId> {
        (**self).body()
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        (**self).parent(node)
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        (**self).children(node)
    }
    fn tag_name(&self, node: NodeId) -> String {
        (**self).tag_name(node)
    }
    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        (**self).attribute(node, name)
    }
    fn text_content(&self, node: NodeId) -> String {
        (**self).text_content(node)
    }
    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle> {
        (**self).computed_style(node)
    }
    fn bounding_box(&self, node: NodeId) -> Result<Rect> {
        (**self).bounding_box(node)
    }
}

/// What changed in a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    Attributes { name: String },
    ChildList { added: Vec<NodeId>, removed: Vec<NodeId> },
    CharacterData,
}

/// One observed tree mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Node whose attributes, children or text changed
    pub target: NodeId,
    pub kind: MutationKind,
}

/// Receiving end of a mutation subscription. Dropping it unsubscribes.
pub type MutationStream = UnboundedReceiver<MutationRecord>;

/// Subtree mutation notifications
pub trait MutationSource {
    fn subscribe(&self) -> MutationStream;
}

impl<T: MutationSource + ?Sized> MutationSource for &T {
    fn subscribe(&self) -> MutationStream {
        (**self).subscribe()
    }
}
