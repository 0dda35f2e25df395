// SPDX-License-Identifier: PMPL-1.0-or-later
//! Debounced re-scanning of a live document.
//!
//! The scheduler is a small state machine driven by mutation records and a
//! clock. Hosts with their own event loop call [`ScanScheduler::notify`] and
//! await [`ScanScheduler::poll`] directly; everyone else awaits
//! [`ScanScheduler::run`], which drives the same machine from the mutation
//! channel, a debounce timer and a stop signal.
//!
//! ```text
//!   Idle --mutation--> Pending --mutation--> Pending (deadline reset)
//!    ^                    |
//!    +----- Scanning <----+ deadline reached
//!
//!   any --stop()--> Stopped
//! ```

use crate::auditor::{Auditor, ScanReport};
use crate::config::SchedulerConfig;
use crate::dom::{
    DocumentTree, MutationKind, MutationRecord, MutationSource, MutationStream, NodeId,
};
use crate::suppression::{NoPersistence, SuppressionPersistence};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for mutations
    Idle,
    /// A re-scan is due at `deadline` unless another mutation arrives first
    Pending { deadline: Instant },
    /// Scan pipeline running
    Scanning,
    /// Subscription dropped; no further scans are scheduled
    Stopped,
}

/// Requests a running scheduler to stop from outside its loop
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// What woke the run loop
enum Wake {
    Stop,
    Mutation(Option<MutationRecord>),
    Deadline,
}

/// Keeps an [`Auditor`]'s report in step with a mutating document
pub struct ScanScheduler<T: DocumentTree + MutationSource> {
    auditor: Auditor<T>,
    state: SchedulerState,
    debounce: Duration,
    /// Id of the host's report UI element; mutations inside it never trigger scans
    ui_root_id: Option<String>,
    /// Explicit report UI root, checked in addition to `ui_root_id`
    ui_root: Option<NodeId>,
    subscription: Option<MutationStream>,
    persistence: Box<dyn SuppressionPersistence>,
    host: String,
    stop_tx: Arc<watch::Sender<bool>>,
    scans_completed: u64,
}

impl<T: DocumentTree + MutationSource> ScanScheduler<T> {
    pub fn new(auditor: Auditor<T>, config: &SchedulerConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            auditor,
            state: SchedulerState::Idle,
            debounce: config.debounce(),
            ui_root_id: config.ui_root_id.clone(),
            ui_root: None,
            subscription: None,
            persistence: Box::new(NoPersistence),
            host: String::new(),
            stop_tx: Arc::new(stop_tx),
            scans_completed: 0,
        }
    }

    /// Load persisted suppressions for `host` before each debounced scan
    pub fn with_persistence(
        mut self,
        persistence: Box<dyn SuppressionPersistence>,
        host: &str,
    ) -> Self {
        self.persistence = persistence;
        self.host = host.to_string();
        self
    }

    /// Subscribe to the document's mutations
    pub fn observe(&mut self) {
        if self.state == SchedulerState::Stopped || self.subscription.is_some() {
            return;
        }
        self.subscription = Some(self.auditor.tree().subscribe());
        debug!("Observing mutations");
    }

    /// Treat `ui_root` and its subtree as report UI, whatever its id
    pub fn set_ui_root(&mut self, ui_root: Option<NodeId>) {
        self.ui_root = ui_root;
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed
    }

    pub fn auditor(&self) -> &Auditor<T> {
        &self.auditor
    }

    pub fn auditor_mut(&mut self) -> &mut Auditor<T> {
        &mut self.auditor
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Scan now, cancelling any pending deadline
    pub fn run_scan(&mut self) -> &ScanReport {
        let resume = self.resume_state();
        self.state = SchedulerState::Scanning;
        let report = self.auditor.run_scan();
        self.scans_completed += 1;
        self.state = resume;
        report
    }

    /// Scan now after reloading the persisted suppression list
    pub async fn run_debounced_scan(&mut self) -> &ScanReport {
        let resume = self.resume_state();
        self.state = SchedulerState::Scanning;
        let report = self
            .auditor
            .run_scan_with(self.persistence.as_ref(), &self.host)
            .await;
        self.scans_completed += 1;
        self.state = resume;
        report
    }

    fn resume_state(&self) -> SchedulerState {
        if self.state == SchedulerState::Stopped {
            SchedulerState::Stopped
        } else {
            SchedulerState::Idle
        }
    }

    /// Feed one mutation observed at `now`. Returns whether it (re)armed the
    /// debounce deadline.
    pub fn notify(&mut self, record: &MutationRecord, now: Instant) -> bool {
        if self.state == SchedulerState::Stopped {
            return false;
        }
        if self.is_ui_mutation(record) {
            trace!(target_node = %record.target, "Ignoring report UI mutation");
            return false;
        }

        let deadline = now + self.debounce;
        if let SchedulerState::Pending { .. } = self.state {
            trace!("Debounce deadline reset");
        } else {
            debug!(?deadline, "Re-scan scheduled");
        }
        self.state = SchedulerState::Pending { deadline };
        true
    }

    /// Drain mutations already queued on the subscription without waiting
    pub fn process_pending(&mut self, now: Instant) -> usize {
        let mut records = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Ok(record) = subscription.try_recv() {
                records.push(record);
            }
        }
        records.iter().filter(|r| self.notify(r, now)).count()
    }

    /// Scan if the debounce deadline has passed, reloading persisted
    /// suppressions first as [`run`](Self::run) does
    pub async fn poll(&mut self, now: Instant) -> Option<&ScanReport> {
        match self.state {
            SchedulerState::Pending { deadline } if now >= deadline => {
                Some(self.run_debounced_scan().await)
            }
            _ => None,
        }
    }

    /// Drop the subscription and cancel any pending scan. Idempotent.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.subscription = None;
        self.state = SchedulerState::Stopped;
        self.stop_tx.send_replace(true);
        info!(scans = self.scans_completed, "Scheduler stopped");
    }

    fn is_ui_mutation(&self, record: &MutationRecord) -> bool {
        if self.ui_root.is_none() && self.ui_root_id.is_none() {
            return false;
        }
        if self.in_ui(record.target) {
            return true;
        }
        match &record.kind {
            MutationKind::ChildList { added, removed } => {
                let mut touched = added.iter().chain(removed.iter()).peekable();
                touched.peek().is_some() && touched.all(|&n| self.in_ui(n))
            }
            _ => false,
        }
    }

    /// Whether `node` is, or lies inside, the report UI. Resolved against the
    /// live tree so a re-rendered panel is recognised by its id. Removed
    /// nodes keep their attributes, so a detached panel still matches.
    fn in_ui(&self, node: NodeId) -> bool {
        let tree = self.auditor.tree();
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .any(|n| Some(n) == self.ui_root || self.has_ui_id(n))
    }

    fn has_ui_id(&self, node: NodeId) -> bool {
        match self.ui_root_id.as_deref() {
            Some(id) => self.auditor.tree().attribute(node, "id").as_deref() == Some(id),
            None => false,
        }
    }

    /// Drive the scheduler until stopped, calling `on_report` after each
    /// debounced scan. Subscribes first if [`observe`](Self::observe) was not called.
    pub async fn run<F>(&mut self, mut on_report: F)
    where
        F: FnMut(&ScanReport),
    {
        self.observe();
        let mut stop_rx = self.stop_tx.subscribe();

        loop {
            if *stop_rx.borrow() || self.state == SchedulerState::Stopped {
                break;
            }
            let deadline = self.deadline();
            if self.subscription.is_none() && deadline.is_none() {
                debug!("Mutation source closed with nothing pending");
                break;
            }

            let wake = {
                let subscription = self.subscription.as_mut();
                let recv = async {
                    match subscription {
                        Some(s) => s.recv().await,
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    _ = stop_rx.changed() => Wake::Stop,
                    record = recv => Wake::Mutation(record),
                    _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                        Wake::Deadline
                    }
                }
            };

            match wake {
                Wake::Stop => {}
                Wake::Mutation(Some(record)) => {
                    self.notify(&record, Instant::now());
                }
                Wake::Mutation(None) => {
                    self.subscription = None;
                }
                Wake::Deadline => {
                    let report = self.run_debounced_scan().await;
                    on_report(report);
                }
            }
        }

        self.stop();
    }
}
