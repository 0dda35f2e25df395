// SPDX-License-Identifier: PMPL-1.0-or-later
//! Effective background resolution.
//!
//! Walks from a node outwards until a painted background is found. The
//! document element is never inspected; running off the top means the page
//! canvas, which is taken to be white.

use crate::color::Color;
use crate::dom::{DocumentTree, NodeId};
use crate::error::Result;

/// Backgrounds at or below this alpha are treated as see-through
const MIN_BACKGROUND_ALPHA: f64 = 0.01;

/// Opaque color behind `node`, or `None` when an image, gradient or
/// text-clipped background makes it unknowable.
pub fn resolve(tree: &dyn DocumentTree, node: NodeId) -> Result<Option<Color>> {
    let root = tree.root();
    let mut current = Some(node);

    while let Some(n) = current {
        if n == root {
            break;
        }
        let style = tree.computed_style(n)?;
        if style.background_is_image_or_gradient {
            return Ok(None);
        }
        if style.background_color.a > MIN_BACKGROUND_ALPHA {
            return Ok(Some(style.background_color.opaque()));
        }
        current = tree.parent(n);
    }

    Ok(Some(Color::WHITE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn resolve_id(html: &str, id: &str) -> Option<Color> {
        let doc = Document::from_html(html);
        let node = doc.element_by_id(id).unwrap();
        resolve(&doc, node).unwrap()
    }

    #[test]
    fn test_defaults_to_white() {
        let html = r#"<html><body><p id="p">x</p></body></html>"#;
        assert_eq!(resolve_id(html, "p"), Some(Color::WHITE));
    }

    #[test]
    fn test_root_background_is_not_consulted() {
        let html = r#"<html style="background:#000"><body><p id="p">x</p></body></html>"#;
        assert_eq!(resolve_id(html, "p"), Some(Color::WHITE));
    }

    #[test]
    fn test_nearest_painted_ancestor_wins() {
        let html = r#"<html><body style="background:#fff">
            <div style="background-color: rgb(10, 20, 30)">
              <span style="background: transparent"><b id="b">x</b></span>
            </div></body></html>"#;
        assert_eq!(resolve_id(html, "b"), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_translucent_background_is_forced_opaque() {
        let html = r#"<html><body>
            <div style="background-color: rgba(200, 0, 0, 0.3)"><p id="p">x</p></div>
            </body></html>"#;
        let color = resolve_id(html, "p").unwrap();
        assert_eq!(color, Color::rgb(200, 0, 0));
    }

    #[test]
    fn test_near_transparent_is_skipped() {
        let html = r#"<html><body style="background:#333">
            <div style="background-color: rgba(255, 255, 255, 0.01)"><p id="p">x</p></div>
            </body></html>"#;
        assert_eq!(resolve_id(html, "p"), Some(Color::rgb(0x33, 0x33, 0x33)));
    }

    #[test]
    fn test_image_or_gradient_is_unresolvable() {
        let html = r#"<html><body>
            <div style="background-image: linear-gradient(red, blue)"><p id="g">x</p></div>
            <div style="background: url(bg.png) #fff"><p id="u">x</p></div>
            </body></html>"#;
        assert_eq!(resolve_id(html, "g"), None);
        assert_eq!(resolve_id(html, "u"), None);
    }

    #[test]
    fn test_painted_node_shadows_image_further_out() {
        let html = r#"<html><body style="background-image: url(a.png)">
            <div style="background:#000"><p id="p">x</p></div></body></html>"#;
        assert_eq!(resolve_id(html, "p"), Some(Color::BLACK));
    }

    #[test]
    fn test_result_is_always_opaque() {
        let html = r#"<html><body>
            <div id="a" style="background: rgba(0,0,0,0.5)"></div>
            <div id="b" style="background: rgba(0,0,0,0.02)"></div>
            <div id="c" style="background: #12345680"></div>
            <div id="d"></div></body></html>"#;
        let doc = Document::from_html(html);
        for name in ["a", "b", "c", "d"] {
            let node = doc.element_by_id(name).unwrap();
            let color = resolve(&doc, node).unwrap().unwrap();
            assert_eq!(color.a, 1.0, "{} resolved to {}", name, color);
        }
    }
}
