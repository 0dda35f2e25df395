// SPDX-License-Identifier: PMPL-1.0-or-later
//! Debounced re-scan tests on a paused clock

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use wcagbot::config::{AuditConfig, SchedulerConfig};
use wcagbot::suppression::SuppressionPersistence;
use wcagbot::{Auditor, Document, DocumentTree, ScanScheduler, SchedulerState, SharedDocument};

const PAGE: &str = r#"<html><body>
    <main id="content"><p>Welcome</p></main>
    <aside id="a11y-panel"><ol></ol></aside>
    </body></html>"#;

fn scheduler_for(doc: &SharedDocument) -> ScanScheduler<SharedDocument> {
    let auditor = Auditor::new(doc.clone(), AuditConfig::default());
    let config = SchedulerConfig {
        debounce_ms: 500,
        ui_root_id: Some("a11y-panel".to_string()),
    };
    ScanScheduler::new(auditor, &config)
}

/// Fixed suppression list held in memory
struct MemoryStore {
    paths: Vec<String>,
}

#[async_trait]
impl SuppressionPersistence for MemoryStore {
    async fn load(&self, _host: &str) -> wcagbot::Result<Vec<String>> {
        Ok(self.paths.clone())
    }

    async fn save(&self, _host: &str, _paths: &[String]) -> wcagbot::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_mutations_scans_once() {
    let doc = Document::from_html(PAGE).into_shared();
    let body = doc.borrow().body().unwrap();
    let mut scheduler = scheduler_for(&doc);
    scheduler.observe();
    let stop = scheduler.stop_handle();

    let mut reports = Vec::new();
    let driver = scheduler.run(|report| reports.push(report.issues.len()));
    let host = async {
        for i in 0..3 {
            doc.borrow_mut()
                .append_html(body, &format!(r#"<img src="{}.png">"#, i))
                .unwrap();
            sleep(Duration::from_millis(200)).await;
        }
        sleep(Duration::from_millis(1000)).await;
        stop.stop();
    };
    tokio::join!(driver, host);

    assert_eq!(reports, vec![3]);
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.scans_completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_separated_mutations_scan_twice() {
    let doc = Document::from_html(PAGE).into_shared();
    let body = doc.borrow().body().unwrap();
    let mut scheduler = scheduler_for(&doc);
    let stop = scheduler.stop_handle();

    let mut reports = Vec::new();
    let driver = scheduler.run(|report| reports.push(report.issues.len()));
    let host = async {
        // Let the driver subscribe before mutating.
        tokio::task::yield_now().await;
        doc.borrow_mut().append_html(body, "<img src=a.png>").unwrap();
        sleep(Duration::from_millis(800)).await;
        doc.borrow_mut().append_html(body, "<img src=b.png>").unwrap();
        sleep(Duration::from_millis(800)).await;
        stop.stop();
    };
    tokio::join!(driver, host);

    assert_eq!(reports, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_report_ui_mutations_never_scan() {
    let doc = Document::from_html(PAGE).into_shared();
    let panel = doc.borrow().element_by_id("a11y-panel").unwrap();
    let list = doc.borrow().children(panel)[0];
    let mut scheduler = scheduler_for(&doc);
    scheduler.observe();
    let stop = scheduler.stop_handle();

    let mut reports = Vec::new();
    let driver = scheduler.run(|report| reports.push(report.issues.len()));
    let host = async {
        for _ in 0..5 {
            doc.borrow_mut().append_html(list, "<li>issue</li>").unwrap();
            doc.borrow_mut().set_attribute(panel, "class", "open").unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_secs(2)).await;
        stop.stop();
    };
    tokio::join!(driver, host);

    assert!(reports.is_empty());
    assert_eq!(scheduler.scans_completed(), 0);
}

/// Replace the report panel with a freshly rendered one
fn render_panel(doc: &SharedDocument, issues: usize) {
    let body = doc.borrow().body().unwrap();
    let old = doc.borrow().element_by_id("a11y-panel");
    if let Some(old) = old {
        doc.borrow_mut().remove(old).unwrap();
    }
    let items = "<li>issue</li>".repeat(issues);
    doc.borrow_mut()
        .append_html(body, &format!(r#"<aside id="a11y-panel"><ol>{}</ol></aside>"#, items))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rerendered_panel_does_not_rearm() {
    let doc = Document::from_html("<html><body><p>Welcome</p></body></html>").into_shared();
    let body = doc.borrow().body().unwrap();
    let mut scheduler = scheduler_for(&doc);
    scheduler.observe();
    let stop = scheduler.stop_handle();

    let mut reports = Vec::new();
    let driver = scheduler.run(|report| {
        reports.push(report.issues.len());
        render_panel(&doc, report.issues.len());
    });
    let host = async {
        doc.borrow_mut().append_html(body, "<img src=a.png>").unwrap();
        sleep(Duration::from_secs(3)).await;
        stop.stop();
    };
    tokio::join!(driver, host);

    assert_eq!(reports, vec![1]);
    assert!(doc.borrow().element_by_id("a11y-panel").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_scan() {
    let doc = Document::from_html(PAGE).into_shared();
    let content = doc.borrow().element_by_id("content").unwrap();
    let mut scheduler = scheduler_for(&doc);
    scheduler.observe();
    let stop = scheduler.stop_handle();

    let mut reports = Vec::new();
    let driver = scheduler.run(|report| reports.push(report.issues.len()));
    let host = async {
        doc.borrow_mut().set_attribute(content, "class", "busy").unwrap();
        sleep(Duration::from_millis(100)).await;
        stop.stop();
        stop.stop();
    };
    tokio::join!(driver, host);

    assert!(reports.is_empty());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    // Mutations after stop go nowhere.
    doc.borrow_mut().set_attribute(content, "class", "idle").unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(scheduler.scans_completed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_run_returns_immediately() {
    let doc = Document::from_html(PAGE).into_shared();
    let mut scheduler = scheduler_for(&doc);
    scheduler.stop();
    scheduler.run(|_| panic!("no scan expected")).await;
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_scan_applies_persisted_paths() {
    let doc = Document::from_html(PAGE).into_shared();
    let body = doc.borrow().body().unwrap();
    let store = MemoryStore {
        paths: vec!["html > body > img".to_string()],
    };
    let mut scheduler = scheduler_for(&doc).with_persistence(Box::new(store), "example.org");
    scheduler.observe();
    let stop = scheduler.stop_handle();

    let driver = scheduler.run(|_| {});
    let host = async {
        doc.borrow_mut().append_html(body, "<img src=a.png>").unwrap();
        sleep(Duration::from_secs(1)).await;
        stop.stop();
    };
    tokio::join!(driver, host);

    let auditor = scheduler.auditor();
    assert_eq!(auditor.last_report().unwrap().issues.len(), 1);
    assert!(auditor.active_issues().is_empty());
}
