// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report rendering for scan results.
//!
//! Supports two output formats:
//! - Text: per-kind summary header, then one entry per issue
//! - JSON: issue records with their mute state, for programmatic consumption

use crate::auditor::ScanReport;
use crate::issue::{IssueKind, IssueRecord};
use crate::suppression::SuppressionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report for a scan, marking muted issues
pub fn generate_report(
    report: &ScanReport,
    suppression: &SuppressionStore,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => generate_text_report(report, suppression),
        OutputFormat::Json => generate_json_report(report, suppression),
    }
}

fn generate_text_report(report: &ScanReport, suppression: &SuppressionStore) -> String {
    let mut output = String::new();

    output.push_str("=== wcagbot Accessibility Report ===\n\n");

    if report.issues.is_empty() {
        output.push_str("No accessibility issues found.\n");
        return output;
    }

    let active = suppression.active(&report.issues).len();
    let muted = report.issues.len() - active;
    output.push_str(&format!(
        "Found {} issue(s): {} active, {} muted\n",
        report.issues.len(),
        active,
        muted
    ));

    let counts = report.issues.counts_by_kind();
    let summary: Vec<String> = IssueKind::ALL
        .iter()
        .map(|kind| format!("{}: {}", kind, counts.get(kind).copied().unwrap_or(0)))
        .collect();
    output.push_str(&summary.join(" | "));
    output.push_str("\n\n");

    for issue in &report.issues {
        let marker = if suppression.is_muted(issue.node) {
            " (muted)"
        } else {
            ""
        };
        output.push_str(&format!("[{}]{} {}\n", issue.kind, marker, issue.message));
        output.push_str(&format!("  Element: {}\n", issue.selector_path));
        if !issue.standard_refs.is_empty() {
            output.push_str(&format!("  WCAG: {}\n", issue.standard_refs.join(", ")));
        }
        output.push('\n');
    }

    if report.skipped_nodes > 0 {
        output.push_str(&format!(
            "{} element(s) could not be read and were skipped\n",
            report.skipped_nodes
        ));
    }

    output
}

#[derive(Debug, Serialize)]
struct JsonReport {
    id: Uuid,
    started_at: DateTime<Utc>,
    skipped_nodes: usize,
    issues: Vec<JsonIssue>,
}

#[derive(Debug, Serialize)]
struct JsonIssue {
    #[serde(flatten)]
    record: IssueRecord,
    muted: bool,
}

fn generate_json_report(report: &ScanReport, suppression: &SuppressionStore) -> String {
    let doc = JsonReport {
        id: report.id,
        started_at: report.started_at,
        skipped_nodes: report.skipped_nodes,
        issues: report
            .issues
            .iter()
            .map(|issue| JsonIssue {
                record: issue.record(),
                muted: suppression.is_muted(issue.node),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::issue::{Issue, IssueSet};

    fn scan_report() -> ScanReport {
        let mut issues = IssueSet::new();
        issues.push(
            Issue::new(IssueKind::MissingAltText, NodeId(4), "image missing alternative text")
                .with_refs(&["1.1.1"])
                .with_selector_path("img#logo"),
        );
        issues.push(
            Issue::new(IssueKind::LowContrast, NodeId(9), "contrast 2.85:1 is below 4.5:1")
                .with_refs(&["1.4.3"])
                .with_selector_path("html > body > p"),
        );
        ScanReport {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            issues,
            skipped_nodes: 0,
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_report() {
        let report = scan_report();
        let mut store = SuppressionStore::new();
        store.mute(NodeId(9));
        let text = generate_report(&report, &store, OutputFormat::Text);
        assert!(text.contains("Found 2 issue(s): 1 active, 1 muted"));
        assert!(text.contains("Missing alt text: 1 | Missing label: 0 | Low contrast: 1"));
        assert!(text.contains("[Low contrast] (muted) contrast 2.85:1 is below 4.5:1"));
        assert!(text.contains("  Element: img#logo"));
    }

    #[test]
    fn test_empty_text_report() {
        let mut report = scan_report();
        report.issues = IssueSet::new();
        let text = generate_report(&report, &SuppressionStore::new(), OutputFormat::Text);
        assert!(text.contains("No accessibility issues found."));
    }

    #[test]
    fn test_json_report() {
        let report = scan_report();
        let mut store = SuppressionStore::new();
        store.mute(NodeId(4));
        let json = generate_report(&report, &store, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["issues"][0]["kind"], "MissingAltText");
        assert_eq!(value["issues"][0]["muted"], true);
        assert_eq!(value["issues"][1]["muted"], false);
        assert_eq!(value["issues"][1]["standard_refs"][0], "1.4.3");
    }
}
