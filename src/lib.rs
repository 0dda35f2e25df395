// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot - live accessibility audits of a rendered document
//!
//! wcagbot inspects a document tree for three WCAG defects and keeps its
//! report current as the tree mutates. The tree, its computed styles and its
//! mutation feed are injected capabilities ([`dom::DocumentTree`],
//! [`dom::MutationSource`]); [`dom::Document`] provides both for static HTML.
//!
//! ## Rules
//!
//! - **Alt Text** (1.1.1): visible images without an `alt` attribute
//! - **Labels** (3.3.2/1.3.1): form controls with no associated label
//! - **Contrast** (1.4.3): text below 4.5:1, or 3:1 for large text
//!
//! Rules run in that order and each node is reported at most once per scan.
//!
//! ## Suppression
//!
//! Subtrees opt out with `data-a11y-ignore="all|alt|labels|contrast"`.
//! Individual issues can be muted at runtime, and muted selector paths can be
//! persisted per host.

pub mod applicability;
pub mod auditor;
pub mod background;
pub mod color;
pub mod config;
pub mod dom;
pub mod error;
pub mod identity;
pub mod issue;
pub mod report;
pub mod rules;
pub mod scheduler;
pub mod suppression;

pub use auditor::{Auditor, ScanReport};
pub use color::{contrast_ratio, relative_luminance, Color};
pub use config::Config;
pub use dom::{Document, DocumentTree, MutationSource, NodeId, SharedDocument};
pub use error::{AuditError, Result};
pub use issue::{Issue, IssueKind, IssueRecord, IssueSet};
pub use scheduler::{ScanScheduler, SchedulerState, StopHandle};
pub use suppression::{JsonFileStore, SuppressionPersistence, SuppressionStore};
