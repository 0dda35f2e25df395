// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue records produced by a scan.
//!
//! An [`Issue`] points back at its node through a [`NodeId`] handle and never
//! outlives the scan that produced it: re-scans replace the whole set.
//! [`IssueRecord`] is the node-free projection handed to export collaborators.

use crate::dom::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The defect a rule detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    MissingAltText,
    MissingLabel,
    LowContrast,
}

impl IssueKind {
    /// Every kind, in rule evaluation order
    pub const ALL: [IssueKind; 3] = [
        IssueKind::MissingAltText,
        IssueKind::MissingLabel,
        IssueKind::LowContrast,
    ];

    /// Token used in ignore annotations
    pub fn token(&self) -> &'static str {
        match self {
            IssueKind::MissingAltText => "alt",
            IssueKind::MissingLabel => "labels",
            IssueKind::LowContrast => "contrast",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        IssueKind::ALL
            .into_iter()
            .find(|k| k.token().eq_ignore_ascii_case(token.trim()))
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::MissingAltText => write!(f, "Missing alt text"),
            IssueKind::MissingLabel => write!(f, "Missing label"),
            IssueKind::LowContrast => write!(f, "Low contrast"),
        }
    }
}

/// One finding against one node
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    /// Non-owning handle to the flagged node
    pub node: NodeId,
    pub message: String,
    pub selector_path: String,
    /// WCAG success criteria, most specific first
    pub standard_refs: Vec<String>,
}

impl Issue {
    /// Create a new issue
    pub fn new(kind: IssueKind, node: NodeId, message: impl Into<String>) -> Self {
        Self {
            kind,
            node,
            message: message.into(),
            selector_path: String::new(),
            standard_refs: Vec::new(),
        }
    }

    /// Set WCAG success criterion references
    pub fn with_refs(mut self, refs: &[&str]) -> Self {
        self.standard_refs = refs.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Set the structural path of the node
    pub fn with_selector_path(mut self, path: impl Into<String>) -> Self {
        self.selector_path = path.into();
        self
    }

    /// Serializable projection without the node handle
    pub fn record(&self) -> IssueRecord {
        IssueRecord {
            kind: self.kind,
            message: self.message.clone(),
            selector_path: self.selector_path.clone(),
            standard_refs: self.standard_refs.clone(),
        }
    }
}

/// Export shape of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub kind: IssueKind,
    pub message: String,
    pub selector_path: String,
    pub standard_refs: Vec<String>,
}

/// Ordered issues from one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueSet {
    issues: Vec<Issue>,
}

impl IssueSet {
    /// Create empty set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }

    pub fn by_kind(&self, kind: IssueKind) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.kind == kind).collect()
    }

    /// Issue for a node, if one was raised
    pub fn for_node(&self, node: NodeId) -> Option<&Issue> {
        self.issues.iter().find(|i| i.node == node)
    }

    /// Issue counts per kind, for report headers
    pub fn counts_by_kind(&self) -> BTreeMap<IssueKind, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn records(&self) -> Vec<IssueRecord> {
        self.issues.iter().map(Issue::record).collect()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip() {
        for kind in IssueKind::ALL {
            assert_eq!(IssueKind::from_token(kind.token()), Some(kind));
        }
        assert_eq!(IssueKind::from_token(" Contrast "), Some(IssueKind::LowContrast));
        assert_eq!(IssueKind::from_token("all"), None);
    }

    #[test]
    fn test_counts_by_kind() {
        let mut set = IssueSet::new();
        set.push(Issue::new(IssueKind::LowContrast, NodeId(3), "a"));
        set.push(Issue::new(IssueKind::MissingAltText, NodeId(1), "b"));
        set.push(Issue::new(IssueKind::LowContrast, NodeId(4), "c"));
        let counts = set.counts_by_kind();
        assert_eq!(counts[&IssueKind::LowContrast], 2);
        assert_eq!(counts[&IssueKind::MissingAltText], 1);
        assert!(!counts.contains_key(&IssueKind::MissingLabel));
    }

    #[test]
    fn test_record_projection_serializes() {
        let issue = Issue::new(IssueKind::MissingAltText, NodeId(7), "image missing alternative text")
            .with_refs(&["1.1.1"])
            .with_selector_path("body > img");
        let json = serde_json::to_value(issue.record()).unwrap();
        assert_eq!(json["kind"], "MissingAltText");
        assert_eq!(json["selector_path"], "body > img");
        assert_eq!(json["standard_refs"][0], "1.1.1");
        assert!(json.get("node").is_none());
    }
}
