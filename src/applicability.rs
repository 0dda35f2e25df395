// SPDX-License-Identifier: PMPL-1.0-or-later
//! Applicability predicates shared by the rules.
//!
//! Each predicate reads the tree through the injected [`DocumentTree`]. Only
//! the predicates that need computed style or geometry can fail; they return
//! the accessor's error so the calling rule can skip the node.

use crate::dom::{Display, DocumentTree, NodeId, Visibility};
use crate::error::Result;
use crate::issue::IssueKind;
use crate::suppression::annotation_suppresses;

/// Elements that never render text of their own
pub const NON_RENDERING_TAGS: &[&str] = &[
    "html", "head", "meta", "link", "style", "script", "noscript", "br", "hr", "iframe", "svg",
    "canvas", "video", "audio", "img", "source", "track", "picture",
];

/// `input` types that need no visible label
pub const EXEMPT_INPUT_TYPES: &[&str] = &[
    "hidden", "submit", "reset", "button", "image", "checkbox", "radio", "range", "color", "file",
];

const INTERACTIVE_TAGS: &[&str] = &["button", "input", "select", "textarea", "summary"];

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "checkbox",
    "radio",
    "switch",
    "tab",
    "menuitem",
    "option",
    "textbox",
    "combobox",
    "slider",
];

/// Below this opacity an element counts as invisible
const MIN_VISIBLE_OPACITY: f64 = 0.1;

/// Predicates over one tree, with the configured ignore attribute
#[derive(Clone, Copy)]
pub struct Applicability<'a> {
    tree: &'a dyn DocumentTree,
    ignore_attribute: &'a str,
}

impl<'a> Applicability<'a> {
    pub fn new(tree: &'a dyn DocumentTree, ignore_attribute: &'a str) -> Self {
        Self {
            tree,
            ignore_attribute,
        }
    }

    /// Rendered with a non-empty box, visible, and not faded out
    pub fn is_visible(&self, node: NodeId) -> Result<bool> {
        let rect = self.tree.bounding_box(node)?;
        if rect.is_empty() {
            return Ok(false);
        }
        let style = self.tree.computed_style(node)?;
        Ok(style.visibility == Visibility::Visible
            && style.opacity >= MIN_VISIBLE_OPACITY
            && style.display != Display::None)
    }

    /// Rendered text remains after stripping all whitespace
    pub fn has_text(&self, node: NodeId) -> bool {
        self.tree
            .text_content(node)
            .chars()
            .any(|c| !c.is_whitespace())
    }

    /// The node is an `svg` element or lies inside one
    pub fn is_in_graphics_container(&self, node: NodeId) -> bool {
        self.inclusive_ancestors(node)
            .any(|n| self.tree.tag_name(n) == "svg")
    }

    /// An inclusive ancestor's ignore annotation covers `kind`
    pub fn is_suppressed(&self, node: NodeId, kind: IssueKind) -> bool {
        self.inclusive_ancestors(node).any(|n| {
            self.tree
                .attribute(n, self.ignore_attribute)
                .is_some_and(|v| annotation_suppresses(&v, kind))
        })
    }

    /// An `input` whose type needs no label
    pub fn is_exempt_control(&self, node: NodeId) -> bool {
        if self.tree.tag_name(node) != "input" {
            return false;
        }
        let input_type = self
            .tree
            .attribute(node, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string());
        EXEMPT_INPUT_TYPES.contains(&input_type.as_str())
    }

    /// Focusable or activatable by role, tag, link target or tab index
    pub fn is_interactive(&self, node: NodeId) -> bool {
        let tag = self.tree.tag_name(node);
        if INTERACTIVE_TAGS.contains(&tag.as_str()) {
            return true;
        }
        if tag == "a" && self.tree.has_attribute(node, "href") {
            return true;
        }
        if let Some(role) = self.tree.attribute(node, "role") {
            if INTERACTIVE_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()) {
                return true;
            }
        }
        self.tree
            .attribute(node, "tabindex")
            .and_then(|t| t.trim().parse::<i32>().ok())
            .is_some_and(|t| t >= 0)
    }

    pub fn is_non_rendering(&self, node: NodeId) -> bool {
        NON_RENDERING_TAGS.contains(&self.tree.tag_name(node).as_str())
    }

    fn inclusive_ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        std::iter::once(node).chain(self.tree.ancestors(node))
    }
}
