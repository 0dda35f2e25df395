// SPDX-License-Identifier: PMPL-1.0-or-later
//! Persisted suppression lists, one per host

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Storage backend for per-host suppressed selector paths
#[async_trait]
pub trait SuppressionPersistence: Send + Sync {
    /// Paths suppressed for `host`. A host with nothing stored yields an empty list.
    async fn load(&self, host: &str) -> Result<Vec<String>>;

    async fn save(&self, host: &str, paths: &[String]) -> Result<()>;
}

/// Backend that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

#[async_trait]
impl SuppressionPersistence for NoPersistence {
    async fn load(&self, _host: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn save(&self, _host: &str, _paths: &[String]) -> Result<()> {
        Ok(())
    }
}

/// On-disk shape of a host's suppression list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSuppressions {
    pub host: String,
    pub paths: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// JSON file per host under a base directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
}

impl JsonFileStore {
    /// Create storage with base path
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn host_file(&self, host: &str) -> PathBuf {
        let safe_name = host.replace(['/', '\\', ':'], "_");
        self.base_path.join(format!("{}.json", safe_name))
    }
}

#[async_trait]
impl SuppressionPersistence for JsonFileStore {
    async fn load(&self, host: &str) -> Result<Vec<String>> {
        let path = self.host_file(host);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let json = tokio::fs::read_to_string(&path).await?;
        let stored: PersistedSuppressions = serde_json::from_str(&json)?;

        debug!(path = %path.display(), count = stored.paths.len(), "Loaded suppressions");
        Ok(stored.paths)
    }

    async fn save(&self, host: &str, paths: &[String]) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        let path = self.host_file(host);

        let stored = PersistedSuppressions {
            host: host.to_string(),
            paths: paths.to_vec(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&path, json).await?;

        debug!(path = %path.display(), count = paths.len(), "Saved suppressions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_host_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("example.org").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_per_host() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let paths = vec!["body > img".to_string(), "div#nav > a".to_string()];
        store.save("example.org:8080", &paths).await.unwrap();

        assert_eq!(store.load("example.org:8080").await.unwrap(), paths);
        assert!(store.load("other.org").await.unwrap().is_empty());
        assert!(dir.path().join("nested/example.org_8080.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("bad").await.is_err());
    }
}
