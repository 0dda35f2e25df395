// SPDX-License-Identifier: PMPL-1.0-or-later
//! Arena-backed static document built from HTML.
//!
//! Parsing goes through `scraper` (html5ever), so implied `<html>`, `<head>`
//! and `<body>` elements are always present. Styles come from the inline
//! cascade in [`super::style`]; geometry is a nominal box model that is exact
//! about the cases the audit cares about (hidden, collapsed, zero-size).

use super::style::{self, StyleInput};
use super::{
    ComputedStyle, Display, DocumentTree, MutationKind, MutationRecord, MutationSource,
    MutationStream, NodeId, Rect,
};
use crate::error::{AuditError, Result};
use scraper::{ElementRef, Html};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

/// Elements that render a box without needing text content
const REPLACED_TAGS: &[&str] = &[
    "img", "input", "select", "textarea", "button", "svg", "canvas", "video", "iframe", "audio",
    "object", "embed", "progress", "meter",
];

/// Text inside these never renders
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// False once removed from the tree; handles stay valid but reads fail
    attached: bool,
}

/// A mutable, observable document tree
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    observers: RefCell<Vec<UnboundedSender<MutationRecord>>>,
}

/// Document shared between the scan driver and the host that mutates it
pub type SharedDocument = Rc<RefCell<Document>>;

impl Document {
    /// Parse an HTML document
    pub fn from_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::default();
        let root = doc.import(parsed.root_element(), None);
        doc.root = Some(root);
        debug!(nodes = doc.nodes.len(), "Parsed document");
        doc
    }

    /// Wrap into a [`SharedDocument`]
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    fn import(&mut self, element: ElementRef<'_>, parent: Option<NodeId>) -> NodeId {
        let value = element.value();
        let attrs = value
            .attrs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        let id = self.push(
            NodeKind::Element {
                tag: value.name().to_ascii_lowercase(),
                attrs,
            },
            parent,
        );

        for child in element.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                self.import(child_el, Some(id));
            } else if let scraper::Node::Text(text) = child.value() {
                let content: &str = &text.text;
                self.push(NodeKind::Text(content.to_owned()), Some(id));
            }
        }
        id
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            attached: true,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn data(&self, node: NodeId) -> Result<&NodeData> {
        self.nodes.get(node.0).ok_or(AuditError::UnknownNode(node))
    }

    fn element(&self, node: NodeId) -> Option<(&str, &[(String, String)])> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { tag, attrs } => Some((tag.as_str(), attrs.as_slice())),
            NodeKind::Text(_) => None,
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        let (_, attrs) = self.element(node)?;
        attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the node and all its ancestors are still in the tree
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            match self.nodes.get(n.0) {
                Some(data) if data.attached => current = data.parent,
                _ => return false,
            }
        }
        true
    }

    /// First element with the given `id` attribute
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.root?;
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// First element matching a tag name
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(&[tag]).into_iter().next()
    }

    fn style_chain(&self, node: NodeId) -> Result<ComputedStyle> {
        if !self.is_connected(node) {
            return Err(AuditError::Detached(node));
        }
        let (tag, _) = self.element(node).ok_or_else(|| AuditError::StyleRead {
            node,
            reason: "not an element".to_string(),
        })?;

        let mut chain = vec![node];
        let mut current = self.nodes[node.0].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes[p.0].parent;
        }

        let mut computed: Option<ComputedStyle> = None;
        for &n in chain.iter().rev() {
            let (tag, _) = match self.element(n) {
                Some(el) => el,
                None => continue,
            };
            let input = StyleInput {
                tag,
                style_attr: self.attr(n, "style"),
                hidden_attr: self.attr(n, "hidden").is_some(),
                aria_hidden_attr: self
                    .attr(n, "aria-hidden")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
            };
            computed = Some(style::compute(&input, computed.as_ref()));
        }
        computed.ok_or_else(|| AuditError::StyleRead {
            node,
            reason: format!("no style computed for <{}>", tag),
        })
    }

    /// Any inclusive ancestor is `display: none`
    fn in_undisplayed_subtree(&self, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.element(n).is_some() && self.style_chain(n)?.display == Display::None {
                return Ok(true);
            }
            current = self.nodes[n.0].parent;
        }
        Ok(false)
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(node.0) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { tag, .. } => {
                if NON_TEXT_TAGS.contains(&tag.as_str()) || self.attr(node, "hidden").is_some() {
                    return;
                }
                let display_none = self
                    .attr(node, "style")
                    .map(style::parse_declarations)
                    .and_then(|d| style::declared(&d, "display").map(|v| v.trim() == "none"))
                    .unwrap_or(false);
                if display_none {
                    return;
                }
                for &child in &data.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn has_replaced_descendant(&self, node: NodeId) -> bool {
        self.descendants(node)
            .into_iter()
            .any(|n| REPLACED_TAGS.contains(&self.tag_name(n).as_str()))
    }

    fn emit(&self, record: MutationRecord) {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|tx| tx.send(record.clone()).is_ok());
    }

    // --- mutation API ---

    /// Set an attribute, notifying observers
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let data = self
            .nodes
            .get_mut(node.0)
            .ok_or(AuditError::UnknownNode(node))?;
        let NodeKind::Element { attrs, .. } = &mut data.kind else {
            return Err(AuditError::StyleRead {
                node,
                reason: "attributes require an element".to_string(),
            });
        };
        let name = name.to_ascii_lowercase();
        match attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.clone(), value.to_string())),
        }
        self.emit(MutationRecord {
            target: node,
            kind: MutationKind::Attributes { name },
        });
        Ok(())
    }

    /// Remove an attribute, notifying observers if it was present
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        let data = self
            .nodes
            .get_mut(node.0)
            .ok_or(AuditError::UnknownNode(node))?;
        if let NodeKind::Element { attrs, .. } = &mut data.kind {
            let before = attrs.len();
            attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            if attrs.len() != before {
                self.emit(MutationRecord {
                    target: node,
                    kind: MutationKind::Attributes {
                        name: name.to_ascii_lowercase(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Parse an HTML fragment and append its elements under `parent`.
    /// Returns the top-level elements that were added.
    pub fn append_html(&mut self, parent: NodeId, fragment: &str) -> Result<Vec<NodeId>> {
        self.data(parent)?;
        let parsed = Html::parse_fragment(fragment);
        let mut added = Vec::new();
        // Fragments parse under a synthetic <html> root element.
        for child in parsed.root_element().children() {
            if let Some(el) = ElementRef::wrap(child) {
                added.push(self.import(el, Some(parent)));
            } else if let scraper::Node::Text(text) = child.value() {
                let content: &str = &text.text;
                self.push(NodeKind::Text(content.to_owned()), Some(parent));
            }
        }
        self.emit(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: added.clone(),
                removed: Vec::new(),
            },
        });
        Ok(added)
    }

    /// Detach a node from its parent. Its handle stays valid but reads fail.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        let parent = self.data(node)?.parent;
        if let Some(p) = parent {
            self.nodes[p.0].children.retain(|&c| c != node);
        }
        let data = &mut self.nodes[node.0];
        data.parent = None;
        data.attached = false;
        if let Some(p) = parent {
            self.emit(MutationRecord {
                target: p,
                kind: MutationKind::ChildList {
                    added: Vec::new(),
                    removed: vec![node],
                },
            });
        }
        Ok(())
    }

    /// Replace the text content of an element
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let data = self
            .nodes
            .get_mut(node.0)
            .ok_or(AuditError::UnknownNode(node))?;
        let children = std::mem::take(&mut data.children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.nodes[child.0].attached = false;
        }
        self.push(NodeKind::Text(text.to_string()), Some(node));
        self.emit(MutationRecord {
            target: node,
            kind: MutationKind::CharacterData,
        });
        Ok(())
    }
}

impl DocumentTree for Document {
    fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId(0))
    }

    fn body(&self) -> Option<NodeId> {
        let root = self.root?;
        self.children(root)
            .into_iter()
            .find(|&n| self.tag_name(n) == "body")
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.element(parent).map(|_| parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|d| {
                d.children
                    .iter()
                    .copied()
                    .filter(|&c| self.element(c).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element(node)
            .map(|(tag, _)| tag.to_string())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attr(node, name).map(str::to_string)
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle> {
        self.style_chain(node)
    }

    fn bounding_box(&self, node: NodeId) -> Result<Rect> {
        let computed = self.style_chain(node)?;
        if self.in_undisplayed_subtree(node)? {
            return Ok(Rect::ZERO);
        }
        let tag = self.tag_name(node);

        let decls = self
            .attr(node, "style")
            .map(style::parse_declarations)
            .unwrap_or_default();
        let explicit = |prop: &str, attr: &str| {
            style::declared(&decls, prop)
                .and_then(|v| style::parse_length(v, computed.font_size_px))
                .or_else(|| self.attr(node, attr).and_then(|v| v.trim().parse::<f64>().ok()))
        };
        let width = explicit("width", "width");
        let height = explicit("height", "height");

        let (nominal_w, nominal_h) = if REPLACED_TAGS.contains(&tag.as_str()) {
            match tag.as_str() {
                "img" | "svg" => (24.0, 24.0),
                "canvas" | "video" | "iframe" => (300.0, 150.0),
                _ => (150.0, computed.font_size_px * 1.25),
            }
        } else if !self.text_content(node).trim().is_empty() || self.has_replaced_descendant(node) {
            (100.0, computed.font_size_px * 1.2)
        } else {
            (0.0, 0.0)
        };

        Ok(Rect::new(width.unwrap_or(nominal_w), height.unwrap_or(nominal_h)))
    }
}

impl MutationSource for Document {
    fn subscribe(&self) -> MutationStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.borrow_mut().push(tx);
        rx
    }
}

impl DocumentTree for SharedDocument {
    fn root(&self) -> NodeId {
        self.borrow().root()
    }
    fn body(&self) -> Option<NodeId> {
        self.borrow().body()
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.borrow().parent(node)
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.borrow().children(node)
    }
    fn tag_name(&self, node: NodeId) -> String {
        self.borrow().tag_name(node)
    }
    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.borrow().attribute(node, name)
    }
    fn text_content(&self, node: NodeId) -> String {
        self.borrow().text_content(node)
    }
    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle> {
        self.borrow().computed_style(node)
    }
    fn bounding_box(&self, node: NodeId) -> Result<Rect> {
        self.borrow().bounding_box(node)
    }
}

impl MutationSource for SharedDocument {
    fn subscribe(&self) -> MutationStream {
        self.borrow().subscribe()
    }
}
