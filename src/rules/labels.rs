// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form label rule - WCAG 3.3.2 Labels or Instructions (Level A), 1.3.1 Info and Relationships
//!
//! A control is labeled by any of:
//! - a `<label for="...">` naming its `id`
//! - an enclosing `<label>`
//! - a non-empty `aria-label` or `aria-labelledby`

use crate::config::AuditConfig;
use crate::dom::NodeId;
use crate::error::Result;
use crate::issue::{Issue, IssueKind};
use crate::rules::{Rule, ScanContext};

/// Unlabeled form control rule
pub struct LabelRule;

const CONTROL_TAGS: &[&str] = &["input", "select", "textarea"];

impl Rule for LabelRule {
    fn name(&self) -> &str {
        "labels"
    }

    fn description(&self) -> &str {
        "Checks that form controls have an associated label (WCAG 3.3.2, 1.3.1)"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::MissingLabel
    }

    fn enabled(&self, config: &AuditConfig) -> bool {
        config.check_labels
    }

    fn candidates(&self, ctx: &ScanContext<'_>) -> Vec<NodeId> {
        ctx.tree.elements_by_tag(CONTROL_TAGS)
    }

    fn check(&self, ctx: &ScanContext<'_>, node: NodeId) -> Result<Option<Issue>> {
        if ctx.applicability.is_exempt_control(node)
            || ctx.applicability.is_suppressed(node, self.kind())
        {
            return Ok(None);
        }
        if !ctx.applicability.is_visible(node)? {
            return Ok(None);
        }
        if is_labeled(ctx, node) {
            return Ok(None);
        }

        let tag = ctx.tree.tag_name(node);
        Ok(Some(
            Issue::new(self.kind(), node, format!("{} has no associated label", tag))
                .with_refs(&["3.3.2", "1.3.1"]),
        ))
    }
}

fn is_labeled(ctx: &ScanContext<'_>, node: NodeId) -> bool {
    let tree = ctx.tree;

    let aria = ["aria-label", "aria-labelledby"].iter().any(|attr| {
        tree.attribute(node, attr)
            .is_some_and(|v| !v.trim().is_empty())
    });
    if aria {
        return true;
    }

    if tree.ancestors(node).iter().any(|&a| tree.tag_name(a) == "label") {
        return true;
    }

    match tree.attribute(node, "id").filter(|id| !id.is_empty()) {
        Some(id) => tree
            .elements_by_tag(&["label"])
            .into_iter()
            .any(|label| tree.attribute(label, "for").as_deref() == Some(id.as_str())),
        None => false,
    }
}
