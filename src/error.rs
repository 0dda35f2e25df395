// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for wcagbot

use crate::dom::NodeId;
use thiserror::Error;

/// Main error type for wcagbot
#[derive(Error, Debug)]
pub enum AuditError {
    /// The style accessor could not produce a computed style for a node.
    #[error("Style unavailable for node {node}: {reason}")]
    StyleRead { node: NodeId, reason: String },

    #[error("Node {0} is detached from the document")]
    Detached(NodeId),

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AuditError {
    /// Failures confined to a single node. Rules skip the node and carry on.
    pub fn is_node_local(&self) -> bool {
        matches!(
            self,
            AuditError::StyleRead { .. } | AuditError::Detached(_) | AuditError::UnknownNode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
