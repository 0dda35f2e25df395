// SPDX-License-Identifier: PMPL-1.0-or-later
//! Suppression state: node mutes, ignore annotations, persisted paths.
//!
//! Mutes are runtime-only and keyed by node identity. They are cleared when a
//! scan starts, so a re-scan regenerates every issue unless the host mutes
//! the node again or a persisted selector path matches it.

mod persist;

pub use persist::{JsonFileStore, NoPersistence, PersistedSuppressions, SuppressionPersistence};

use crate::dom::NodeId;
use crate::issue::{Issue, IssueKind, IssueSet};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Attribute read for declarative ignore annotations
pub const DEFAULT_IGNORE_ATTRIBUTE: &str = "data-a11y-ignore";

/// One token of an ignore annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreToken {
    All,
    Kind(IssueKind),
}

/// Parse a comma-separated annotation value. Unknown tokens are dropped.
pub fn parse_ignore_tokens(value: &str) -> Vec<IgnoreToken> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            if t.eq_ignore_ascii_case("all") {
                Some(IgnoreToken::All)
            } else {
                IssueKind::from_token(t).map(IgnoreToken::Kind)
            }
        })
        .collect()
}

/// Whether an annotation value suppresses `kind`
pub fn annotation_suppresses(value: &str, kind: IssueKind) -> bool {
    parse_ignore_tokens(value)
        .into_iter()
        .any(|t| t == IgnoreToken::All || t == IgnoreToken::Kind(kind))
}

/// Mute set plus the persisted path list for the current host
#[derive(Debug, Clone, Default)]
pub struct SuppressionStore {
    muted: HashSet<NodeId>,
    persisted: BTreeSet<String>,
}

impl SuppressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute(&mut self, node: NodeId) {
        self.muted.insert(node);
    }

    pub fn unmute(&mut self, node: NodeId) {
        self.muted.remove(&node);
    }

    /// Flip the mute state, returning whether the node is now muted
    pub fn toggle(&mut self, node: NodeId) -> bool {
        if self.muted.remove(&node) {
            false
        } else {
            self.muted.insert(node);
            true
        }
    }

    pub fn is_muted(&self, node: NodeId) -> bool {
        self.muted.contains(&node)
    }

    pub fn muted_count(&self) -> usize {
        self.muted.len()
    }

    /// Drop every runtime mute. Called at scan start.
    pub fn clear_mutes(&mut self) {
        self.muted.clear();
    }

    /// Replace the persisted path list
    pub fn set_persisted_paths(&mut self, paths: impl IntoIterator<Item = String>) {
        self.persisted = paths.into_iter().collect();
    }

    pub fn persisted_paths(&self) -> &BTreeSet<String> {
        &self.persisted
    }

    /// Mute every issue whose selector path is in the persisted list.
    /// Paths are not guaranteed unique, so this can over-mute.
    pub fn apply_persisted(&mut self, issues: &IssueSet) -> usize {
        let mut applied = 0;
        for issue in issues {
            if self.persisted.contains(&issue.selector_path) && self.muted.insert(issue.node) {
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(applied, "Applied persisted suppressions");
        }
        applied
    }

    /// Issues that are not muted, in scan order
    pub fn active<'a>(&self, issues: &'a IssueSet) -> Vec<&'a Issue> {
        issues.iter().filter(|i| !self.is_muted(i.node)).collect()
    }

    /// Selector paths of the muted issues, for persisting
    pub fn muted_paths(&self, issues: &IssueSet) -> Vec<String> {
        let paths: BTreeSet<String> = issues
            .iter()
            .filter(|i| self.is_muted(i.node))
            .map(|i| i.selector_path.clone())
            .collect();
        paths.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(node: usize, path: &str) -> Issue {
        Issue::new(IssueKind::LowContrast, NodeId(node), "low").with_selector_path(path)
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(
            parse_ignore_tokens("alt, Contrast,bogus,,all"),
            vec![
                IgnoreToken::Kind(IssueKind::MissingAltText),
                IgnoreToken::Kind(IssueKind::LowContrast),
                IgnoreToken::All,
            ]
        );
        assert!(parse_ignore_tokens("").is_empty());
    }

    #[test]
    fn test_annotation_suppresses() {
        assert!(annotation_suppresses("contrast", IssueKind::LowContrast));
        assert!(!annotation_suppresses("contrast", IssueKind::MissingLabel));
        assert!(annotation_suppresses("all", IssueKind::MissingLabel));
        assert!(annotation_suppresses("alt,labels", IssueKind::MissingLabel));
        assert!(!annotation_suppresses("everything", IssueKind::MissingAltText));
    }

    #[test]
    fn test_toggle() {
        let mut store = SuppressionStore::new();
        assert!(store.toggle(NodeId(1)));
        assert!(store.is_muted(NodeId(1)));
        assert!(!store.toggle(NodeId(1)));
        assert!(!store.is_muted(NodeId(1)));
    }

    #[test]
    fn test_active_filters_muted() {
        let mut set = IssueSet::new();
        set.push(issue(1, "body > p"));
        set.push(issue(2, "body > div"));
        let mut store = SuppressionStore::new();
        store.mute(NodeId(2));
        let active = store.active(&set);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].node, NodeId(1));
        assert_eq!(store.muted_paths(&set), vec!["body > div".to_string()]);
    }

    #[test]
    fn test_apply_persisted_by_path() {
        let mut set = IssueSet::new();
        set.push(issue(1, "body > p"));
        set.push(issue(2, "div#main > span"));
        let mut store = SuppressionStore::new();
        store.set_persisted_paths(vec!["div#main > span".to_string(), "absent".to_string()]);
        assert_eq!(store.apply_persisted(&set), 1);
        assert!(store.is_muted(NodeId(2)));
        assert!(!store.is_muted(NodeId(1)));

        store.clear_mutes();
        assert_eq!(store.muted_count(), 0);
        assert_eq!(store.persisted_paths().len(), 2);
    }
}
