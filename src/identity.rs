// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue identity: the per-scan flagged set and structural selector paths.

use crate::dom::{DocumentTree, NodeId};
use std::collections::HashSet;

/// Path segments kept before giving up on reaching an `id`
pub const MAX_PATH_DEPTH: usize = 5;

/// Nodes that already carry an issue in the current scan
#[derive(Debug, Default)]
pub struct FlaggedNodes {
    nodes: HashSet<NodeId>,
}

impl FlaggedNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node`, returning false if it was already flagged
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Short structural path for a node, e.g. `div#main > ul > li:nth-of-type(3)`.
///
/// Built innermost first and stops at the first segment with an `id` or
/// after [`MAX_PATH_DEPTH`] segments. Not guaranteed unique.
pub fn selector_path(tree: &dyn DocumentTree, node: NodeId) -> String {
    let mut segments = Vec::with_capacity(MAX_PATH_DEPTH);
    let mut current = Some(node);

    while let Some(n) = current {
        if segments.len() == MAX_PATH_DEPTH {
            break;
        }
        let tag = tree.tag_name(n);
        if let Some(id) = tree.attribute(n, "id").filter(|id| !id.trim().is_empty()) {
            segments.push(format!("{}#{}", tag, id.trim()));
            break;
        }

        let parent = tree.parent(n);
        let segment = match parent {
            Some(p) => {
                let same_tag: Vec<NodeId> = tree
                    .children(p)
                    .into_iter()
                    .filter(|&c| tree.tag_name(c) == tag)
                    .collect();
                if same_tag.len() > 1 {
                    let index = same_tag.iter().position(|&c| c == n).unwrap_or(0) + 1;
                    format!("{}:nth-of-type({})", tag, index)
                } else {
                    tag
                }
            }
            None => tag,
        };
        segments.push(segment);
        current = parent;
    }

    segments.reverse();
    segments.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_flagged_nodes() {
        let mut flagged = FlaggedNodes::new();
        assert!(flagged.insert(NodeId(4)));
        assert!(!flagged.insert(NodeId(4)));
        assert!(flagged.contains(NodeId(4)));
        assert_eq!(flagged.len(), 1);
    }

    #[test]
    fn test_path_stops_at_id() {
        let doc = Document::from_html(
            r#"<html><body><div id="main"><ul><li>a</li><li>b</li><li><span>c</span></li></ul></div></body></html>"#,
        );
        let span = doc.first_by_tag("span").unwrap();
        assert_eq!(
            selector_path(&doc, span),
            "div#main > ul > li:nth-of-type(3) > span"
        );
    }

    #[test]
    fn test_path_is_capped() {
        let doc = Document::from_html(
            "<html><body><div><section><article><p><em><b>deep</b></em></p></article></section></div></body></html>",
        );
        let b = doc.first_by_tag("b").unwrap();
        assert_eq!(selector_path(&doc, b), "section > article > p > em > b");
    }

    #[test]
    fn test_path_of_lone_child() {
        let doc = Document::from_html("<html><body><img src=x></body></html>");
        let img = doc.first_by_tag("img").unwrap();
        assert_eq!(selector_path(&doc, img), "html > body > img");
    }

    #[test]
    fn test_node_with_id() {
        let doc = Document::from_html(r#"<html><body><p id="lead">x</p></body></html>"#);
        let p = doc.element_by_id("lead").unwrap();
        assert_eq!(selector_path(&doc, p), "p#lead");
    }
}
