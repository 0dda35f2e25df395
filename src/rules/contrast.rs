// SPDX-License-Identifier: PMPL-1.0-or-later
//! Text contrast rule - WCAG 1.4.3 Contrast (Minimum) (Level AA)
//!
//! Compares each text-bearing element's computed text color against its
//! resolved opaque background. Large text needs 3:1, everything else 4.5:1.
//! <https://www.w3.org/TR/WCAG21/#contrast-minimum>

use crate::background;
use crate::color::contrast_ratio;
use crate::config::AuditConfig;
use crate::dom::{ComputedStyle, NodeId};
use crate::error::Result;
use crate::issue::{Issue, IssueKind};
use crate::rules::{Rule, ScanContext};
use tracing::trace;

/// WCAG AA ratio for normal text
pub const NORMAL_TEXT_THRESHOLD: f64 = 4.5;
/// WCAG AA ratio for large text
pub const LARGE_TEXT_THRESHOLD: f64 = 3.0;

/// Text below this alpha is too faint to judge
const MIN_TEXT_ALPHA: f64 = 0.5;

/// Low contrast rule
pub struct ContrastRule;

/// 18pt, or 14pt bold
pub fn is_large_text(style: &ComputedStyle) -> bool {
    style.font_size_px >= 24.0 || (style.font_size_px >= 18.66 && style.font_weight >= 700)
}

/// Minimum ratio required for text in `style`
pub fn threshold_for(style: &ComputedStyle) -> f64 {
    if is_large_text(style) {
        LARGE_TEXT_THRESHOLD
    } else {
        NORMAL_TEXT_THRESHOLD
    }
}

impl Rule for ContrastRule {
    fn name(&self) -> &str {
        "contrast"
    }

    fn description(&self) -> &str {
        "Checks text against its background for minimum contrast (WCAG 1.4.3)"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::LowContrast
    }

    fn enabled(&self, config: &AuditConfig) -> bool {
        config.check_contrast
    }

    fn candidates(&self, ctx: &ScanContext<'_>) -> Vec<NodeId> {
        let Some(body) = ctx.tree.body() else {
            return Vec::new();
        };
        let nodes = ctx.tree.descendants(body);
        if ctx.config.interactive_only {
            nodes
                .into_iter()
                .filter(|&n| ctx.applicability.is_interactive(n))
                .collect()
        } else {
            nodes
        }
    }

    fn check(&self, ctx: &ScanContext<'_>, node: NodeId) -> Result<Option<Issue>> {
        let app = &ctx.applicability;
        if app.is_non_rendering(node) {
            return Ok(None);
        }
        if !app.is_visible(node)? || !app.has_text(node) || app.is_in_graphics_container(node) {
            return Ok(None);
        }

        let style = ctx.tree.computed_style(node)?;
        if style.aria_hidden || app.is_suppressed(node, self.kind()) {
            return Ok(None);
        }
        if style.text_color.a < MIN_TEXT_ALPHA {
            return Ok(None);
        }

        let Some(bg) = background::resolve(ctx.tree, node)? else {
            trace!(node = %node, "Background unresolvable, skipping");
            return Ok(None);
        };

        let ratio = contrast_ratio(style.text_color, bg);
        let threshold = threshold_for(&style);
        if ratio >= threshold {
            return Ok(None);
        }

        Ok(Some(
            Issue::new(
                self.kind(),
                node,
                format!("contrast {:.2}:1 is below {:.1}:1", ratio, threshold),
            )
            .with_refs(&["1.4.3"]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::rules::evaluate;
    use crate::suppression::DEFAULT_IGNORE_ATTRIBUTE;

    fn check_with(body: &str, config: &AuditConfig) -> Vec<Issue> {
        let doc = Document::from_html(&format!("<html><body>{}</body></html>", body));
        let mut ctx = ScanContext::new(&doc, config, DEFAULT_IGNORE_ATTRIBUTE);
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(ContrastRule)];
        evaluate(&mut ctx, &rules).iter().cloned().collect()
    }

    fn check(body: &str) -> Vec<Issue> {
        check_with(body, &AuditConfig::default())
    }

    #[test]
    fn test_large_text_thresholds() {
        let style = |size: f64, weight: u16| ComputedStyle {
            font_size_px: size,
            font_weight: weight,
            ..ComputedStyle::default()
        };
        assert!(is_large_text(&style(24.0, 400)));
        assert!(is_large_text(&style(18.66, 700)));
        assert!(!is_large_text(&style(18.66, 600)));
        assert!(!is_large_text(&style(23.9, 400)));
        assert_eq!(threshold_for(&style(14.0, 400)), 4.5);
    }

    #[test]
    fn test_grey_on_white_fails() {
        let issues = check(r#"<p style="color: rgb(119,119,119); font-size: 14px">Body copy</p>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "contrast 4.48:1 is below 4.5:1");
        assert_eq!(issues[0].standard_refs, vec!["1.4.3".to_string()]);
    }

    #[test]
    fn test_large_grey_passes() {
        assert!(check(r#"<p style="color: rgb(119,119,119); font-size: 25px">Heading</p>"#).is_empty());
    }

    #[test]
    fn test_dark_background() {
        let issues = check(
            r#"<div style="background:#000; color:#fff"><p style="color:#333">dim</p><p style="color:#fff">bright</p></div>"#,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("contrast 1."));
    }

    #[test]
    fn test_skips() {
        let issues = check(
            r#"<p style="color:#eee" aria-hidden="true">hidden from AT</p>
               <p style="color:rgba(0,0,0,0.2)">faint</p>
               <div style="background-image:url(x.png)"><p style="color:#eee">on image</p></div>
               <svg><text style="color:#eee">chart</text></svg>
               <p style="color:#eee; visibility:hidden">invisible</p>
               <p style="color:#eee"> </p>
               <section data-a11y-ignore="contrast"><p style="color:#eee">ignored</p></section>"#,
        );
        assert!(issues.is_empty(), "unexpected: {:?}", issues);
    }

    #[test]
    fn test_interactive_only() {
        let body = r#"<p style="color:#bbb">text</p><a href="/x" style="color:#bbb">link</a>"#;
        assert_eq!(check(body).len(), 2);

        let config = AuditConfig {
            interactive_only: true,
            ..AuditConfig::default()
        };
        let issues = check_with(body, &config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].selector_path, "html > body > a");
    }
}
