// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit rules.
//!
//! Rules run in a fixed order (alt text, labels, contrast) over one shared
//! [`ScanContext`]. A node flagged by an earlier rule is never offered to a
//! later one, so each node carries at most one issue per scan.

pub mod alt_text;
pub mod contrast;
pub mod labels;

use crate::applicability::Applicability;
use crate::config::AuditConfig;
use crate::dom::{DocumentTree, NodeId};
use crate::error::Result;
use crate::identity::{self, FlaggedNodes};
use crate::issue::{Issue, IssueKind, IssueSet};
use tracing::{debug, warn};

/// Trait implemented by all rules
pub trait Rule: Send + Sync {
    /// Human-readable name of this rule
    fn name(&self) -> &str;

    /// Short description of what this rule checks
    fn description(&self) -> &str;

    /// Kind of issue this rule raises
    fn kind(&self) -> IssueKind;

    fn enabled(&self, config: &AuditConfig) -> bool;

    /// Nodes to check, in document order
    fn candidates(&self, ctx: &ScanContext<'_>) -> Vec<NodeId>;

    /// Check one candidate. An error means the node could not be read and is skipped.
    fn check(&self, ctx: &ScanContext<'_>, node: NodeId) -> Result<Option<Issue>>;
}

/// State shared by the rules during one scan
pub struct ScanContext<'a> {
    pub tree: &'a dyn DocumentTree,
    pub config: &'a AuditConfig,
    pub applicability: Applicability<'a>,
    flagged: FlaggedNodes,
    skipped: usize,
}

impl<'a> ScanContext<'a> {
    pub fn new(tree: &'a dyn DocumentTree, config: &'a AuditConfig, ignore_attribute: &'a str) -> Self {
        Self {
            tree,
            config,
            applicability: Applicability::new(tree, ignore_attribute),
            flagged: FlaggedNodes::new(),
            skipped: 0,
        }
    }

    pub fn is_flagged(&self, node: NodeId) -> bool {
        self.flagged.contains(node)
    }

    /// Nodes skipped because their style or geometry could not be read
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Every rule, in evaluation order
pub fn all() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(alt_text::AltTextRule),
        Box::new(labels::LabelRule),
        Box::new(contrast::ContrastRule),
    ]
}

/// Run `rules` in order, deduplicating by node
pub fn evaluate(ctx: &mut ScanContext<'_>, rules: &[Box<dyn Rule>]) -> IssueSet {
    let mut issues = IssueSet::new();

    for rule in rules {
        if !rule.enabled(ctx.config) {
            debug!(rule = rule.name(), "Rule disabled");
            continue;
        }

        let candidates = rule.candidates(ctx);
        let before = issues.len();

        for node in candidates {
            if ctx.is_flagged(node) {
                continue;
            }
            match rule.check(ctx, node) {
                Ok(Some(issue)) => {
                    let path = identity::selector_path(ctx.tree, node);
                    ctx.flagged.insert(node);
                    issues.push(issue.with_selector_path(path));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(rule = rule.name(), node = %node, error = %e, "Skipping node");
                    ctx.skipped += 1;
                }
            }
        }

        debug!(rule = rule.name(), found = issues.len() - before, "Rule finished");
    }

    issues
}
