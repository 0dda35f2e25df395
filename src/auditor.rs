// SPDX-License-Identifier: PMPL-1.0-or-later
//! The scan pipeline: rules, deduplication, suppression.

use crate::config::{AuditConfig, Config};
use crate::dom::{DocumentTree, NodeId};
use crate::error::Result;
use crate::issue::{Issue, IssueSet};
use crate::rules::{self, Rule, ScanContext};
use crate::suppression::{SuppressionPersistence, SuppressionStore, DEFAULT_IGNORE_ATTRIBUTE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_issues")]
    pub issues: IssueSet,
    /// Nodes whose style or geometry could not be read
    pub skipped_nodes: usize,
}

fn serialize_issues<S>(issues: &IssueSet, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    issues.records().serialize(s)
}

/// Runs the audit over an injected document tree and owns suppression state
pub struct Auditor<T: DocumentTree> {
    tree: T,
    config: AuditConfig,
    ignore_attribute: String,
    rules: Vec<Box<dyn Rule>>,
    suppression: SuppressionStore,
    last: Option<ScanReport>,
}

impl<T: DocumentTree> Auditor<T> {
    pub fn new(tree: T, config: AuditConfig) -> Self {
        Self {
            tree,
            config,
            ignore_attribute: DEFAULT_IGNORE_ATTRIBUTE.to_string(),
            rules: rules::all(),
            suppression: SuppressionStore::new(),
            last: None,
        }
    }

    /// Build from a loaded [`Config`]
    pub fn from_config(tree: T, config: &Config) -> Self {
        Self::new(tree, config.audit).with_ignore_attribute(&config.suppression.attribute)
    }

    /// Read ignore annotations from a different attribute
    pub fn with_ignore_attribute(mut self, attribute: &str) -> Self {
        self.ignore_attribute = attribute.to_string();
        self
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Takes effect at the next scan
    pub fn set_config(&mut self, config: AuditConfig) {
        self.config = config;
    }

    pub fn suppression(&self) -> &SuppressionStore {
        &self.suppression
    }

    pub fn mute(&mut self, node: NodeId) {
        self.suppression.mute(node);
    }

    pub fn unmute(&mut self, node: NodeId) {
        self.suppression.unmute(node);
    }

    /// Returns whether the node is now muted
    pub fn toggle_mute(&mut self, node: NodeId) -> bool {
        self.suppression.toggle(node)
    }

    pub fn is_muted(&self, node: NodeId) -> bool {
        self.suppression.is_muted(node)
    }

    /// Run every enabled rule and return the deduplicated issues, without
    /// touching suppression state
    pub fn evaluate(&self) -> (IssueSet, usize) {
        let mut ctx = ScanContext::new(&self.tree, &self.config, &self.ignore_attribute);
        let issues = rules::evaluate(&mut ctx, &self.rules);
        (issues, ctx.skipped())
    }

    /// Full scan using the persisted paths already held by the store
    pub fn run_scan(&mut self) -> &ScanReport {
        let started_at = Utc::now();
        self.suppression.clear_mutes();
        let (issues, skipped_nodes) = self.evaluate();
        self.suppression.apply_persisted(&issues);
        self.finish(started_at, issues, skipped_nodes)
    }

    /// Full scan that first refreshes the persisted path list for `host`.
    ///
    /// A failed load is logged and the previously held list is used.
    pub async fn run_scan_with(
        &mut self,
        persistence: &dyn SuppressionPersistence,
        host: &str,
    ) -> &ScanReport {
        let started_at = Utc::now();
        self.suppression.clear_mutes();
        let (issues, skipped_nodes) = self.evaluate();

        match persistence.load(host).await {
            Ok(paths) => self.suppression.set_persisted_paths(paths),
            Err(e) => warn!(host, error = %e, "Failed to load persisted suppressions"),
        }
        self.suppression.apply_persisted(&issues);
        self.finish(started_at, issues, skipped_nodes)
    }

    fn finish(
        &mut self,
        started_at: DateTime<Utc>,
        issues: IssueSet,
        skipped_nodes: usize,
    ) -> &ScanReport {
        let report = ScanReport {
            id: Uuid::new_v4(),
            started_at,
            issues,
            skipped_nodes,
        };
        info!(
            scan = %report.id,
            issues = report.issues.len(),
            muted = self.suppression.muted_count(),
            skipped = skipped_nodes,
            "Scan complete"
        );
        self.last.insert(report)
    }

    pub fn last_report(&self) -> Option<&ScanReport> {
        self.last.as_ref()
    }

    /// Issues from the last scan that are not muted
    pub fn active_issues(&self) -> Vec<&Issue> {
        match &self.last {
            Some(report) => self.suppression.active(&report.issues),
            None => Vec::new(),
        }
    }

    /// Write the current mutes for `host` as selector paths.
    ///
    /// Paths of unmuted issues from the last scan are dropped from the stored
    /// list, then paths of muted issues are added. Returns the stored count.
    pub async fn persist_mutes(
        &mut self,
        persistence: &dyn SuppressionPersistence,
        host: &str,
    ) -> Result<usize> {
        let mut paths = self.suppression.persisted_paths().clone();
        if let Some(report) = &self.last {
            for issue in report.issues.iter().filter(|i| !self.suppression.is_muted(i.node)) {
                paths.remove(&issue.selector_path);
            }
            paths.extend(self.suppression.muted_paths(&report.issues));
        }

        let paths: Vec<String> = paths.into_iter().collect();
        persistence.save(host, &paths).await?;
        debug!(host, count = paths.len(), "Persisted suppressions");

        let count = paths.len();
        self.suppression.set_persisted_paths(paths);
        Ok(count)
    }
}
