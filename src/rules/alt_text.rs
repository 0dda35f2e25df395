// SPDX-License-Identifier: PMPL-1.0-or-later
//! Alt text rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Flags visible `<img>` elements that carry no `alt` attribute at all.
//! An empty `alt=""` marks the image as decorative and passes.

use crate::config::AuditConfig;
use crate::dom::NodeId;
use crate::error::Result;
use crate::issue::{Issue, IssueKind};
use crate::rules::{Rule, ScanContext};

/// Missing alternative text rule
pub struct AltTextRule;

impl Rule for AltTextRule {
    fn name(&self) -> &str {
        "alt-text"
    }

    fn description(&self) -> &str {
        "Checks that images provide alternative text (WCAG 1.1.1)"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::MissingAltText
    }

    fn enabled(&self, config: &AuditConfig) -> bool {
        config.check_alt_text
    }

    fn candidates(&self, ctx: &ScanContext<'_>) -> Vec<NodeId> {
        ctx.tree.elements_by_tag(&["img"])
    }

    fn check(&self, ctx: &ScanContext<'_>, node: NodeId) -> Result<Option<Issue>> {
        if ctx.tree.has_attribute(node, "alt") {
            return Ok(None);
        }
        if ctx.applicability.is_suppressed(node, self.kind()) {
            return Ok(None);
        }
        if !ctx.applicability.is_visible(node)? {
            return Ok(None);
        }

        Ok(Some(
            Issue::new(self.kind(), node, "image missing alternative text").with_refs(&["1.1.1"]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::rules::evaluate;
    use crate::suppression::DEFAULT_IGNORE_ATTRIBUTE;

    fn check(html: &str) -> Vec<Issue> {
        let doc = Document::from_html(html);
        let config = AuditConfig::default();
        let mut ctx = ScanContext::new(&doc, &config, DEFAULT_IGNORE_ATTRIBUTE);
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(AltTextRule)];
        evaluate(&mut ctx, &rules).iter().cloned().collect()
    }

    #[test]
    fn test_missing_alt() {
        let issues = check(r#"<html><body><img src="photo.jpg"></body></html>"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingAltText);
        assert_eq!(issues[0].message, "image missing alternative text");
        assert_eq!(issues[0].standard_refs, vec!["1.1.1".to_string()]);
    }

    #[test]
    fn test_alt_present_or_decorative() {
        let issues = check(
            r#"<html><body><img src="a.jpg" alt="A cat"><img src="b.jpg" alt=""></body></html>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_hidden_images_skipped() {
        let issues = check(
            r#"<html><body>
                <img src="a.jpg" style="display:none">
                <img src="b.jpg" width="0">
                <div hidden><img src="c.jpg"></div>
                <img src="d.jpg" style="visibility:hidden">
            </body></html>"#,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_suppressed_images_skipped() {
        let issues = check(
            r#"<html><body><figure data-a11y-ignore="alt"><img src="a.jpg"></figure></body></html>"#,
        );
        assert!(issues.is_empty());
    }
}
