//! Handoff store
//!
//! Manages `.stackflow/stacks/<stack>/`, where deployment documents are left
//! for the engine and its reports are kept for later `outputs` lookups.

use crate::document::{DeploymentDocument, DocumentFormat};
use crate::error::{CloudError, Result};
use crate::report::EngineReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_DIR: &str = ".stackflow";
const STACKS_DIR: &str = "stacks";
const DOCUMENT_FILE: &str = "deployment.json";
const DOCUMENT_BACKUP: &str = "deployment.json.backup";
const REPORT_FILE: &str = "report.json";
const LOCK_FILE: &str = "lock.json";

/// Reader/writer for one stack's handoff files
#[derive(Debug, Clone)]
pub struct HandoffStore {
    project_root: PathBuf,
    stack: String,
}

impl HandoffStore {
    pub fn new(project_root: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            stack: stack.into(),
        }
    }

    /// Directory holding this stack's files
    pub fn stack_dir(&self) -> PathBuf {
        self.project_root
            .join(STATE_DIR)
            .join(STACKS_DIR)
            .join(&self.stack)
    }

    pub fn document_path(&self) -> PathBuf {
        self.stack_dir().join(DOCUMENT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.stack_dir().join(DOCUMENT_BACKUP)
    }

    pub fn report_path(&self) -> PathBuf {
        self.stack_dir().join(REPORT_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.stack_dir().join(LOCK_FILE)
    }

    async fn ensure_stack_dir(&self) -> Result<()> {
        let dir = self.stack_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created stack directory: {}", dir.display());
        }
        Ok(())
    }

    /// Write the document, keeping the previous one as a backup
    pub async fn save_document(&self, document: &DeploymentDocument) -> Result<PathBuf> {
        self.ensure_stack_dir().await?;

        let path = self.document_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created deployment document backup");
        }

        let content = document.render(DocumentFormat::Json)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved deployment document with {} resources",
            document.resources.len()
        );
        Ok(path)
    }

    pub async fn load_document(&self) -> Result<Option<DeploymentDocument>> {
        let path = self.document_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(DeploymentDocument::parse(&content, DocumentFormat::Json)?))
    }

    pub async fn save_report(&self, report: &EngineReport) -> Result<()> {
        self.ensure_stack_dir().await?;
        let content = serde_json::to_string_pretty(report)?;
        fs::write(self.report_path(), content).await?;
        tracing::debug!("Saved engine report with {} resources", report.resources.len());
        Ok(())
    }

    /// Last report written by an engine, if any
    pub async fn load_report(&self) -> Result<Option<EngineReport>> {
        let path = self.report_path();
        if !path.exists() {
            tracing::debug!("Report file not found");
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Acquire a lock for exclusive access
    ///
    /// The lock file is created with `create_new`, so only one process wins.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_stack_dir().await?;

        let lock_path = self.lock_path();
        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&lock_info)?;

        let mut file = match create_lock_file(&lock_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let existing = fs::read_to_string(&lock_path).await?;
                // Empty while the winner is still writing
                let Ok(held) = serde_json::from_str::<LockInfo>(&existing) else {
                    return Err(CloudError::LockError(
                        "Stack lock is being acquired by another process".to_string(),
                    ));
                };

                // Locks older than 1 hour are considered stale
                let age = Utc::now().signed_duration_since(held.acquired_at);
                if age.num_hours() < 1 {
                    return Err(CloudError::LockError(format!(
                        "Stack is locked by {} since {}",
                        held.holder, held.acquired_at
                    )));
                }

                tracing::warn!("Removing stale lock from {}", held.holder);
                fs::remove_file(&lock_path).await?;
                create_lock_file(&lock_path).await.map_err(|e| {
                    CloudError::LockError(format!("Failed to take over stale lock: {}", e))
                })?
            }
            Err(e) => return Err(e.into()),
        };

        // Dropping the guard removes the file if the write fails
        let lock = StateLock {
            lock_path,
            released: false,
        };
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Acquired stack lock");
        Ok(lock)
    }
}

async fn create_lock_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the stack lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released stack lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PropertyMap;
    use crate::report::{ResourceState, ResourceStatus};
    use crate::stack::Stack;
    use crate::urn::Urn;
    use tempfile::tempdir;

    fn document(resources: usize) -> DeploymentDocument {
        let mut stack = Stack::new("webstack", "dev");
        for i in 0..resources {
            stack
                .register("test:Thing", &format!("thing-{}", i), PropertyMap::new())
                .unwrap();
        }
        stack.to_document()
    }

    #[tokio::test]
    async fn test_document_save_load_with_backup() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");

        store.save_document(&document(1)).await.unwrap();
        store.save_document(&document(2)).await.unwrap();

        let loaded = store.load_document().await.unwrap().unwrap();
        assert_eq!(loaded.resources.len(), 2);
        assert!(store.backup_path().exists());
        assert!(
            store
                .document_path()
                .ends_with(".stackflow/stacks/dev/deployment.json")
        );
    }

    #[tokio::test]
    async fn test_empty_store() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");

        assert!(store.load_document().await.unwrap().is_none());
        assert!(store.load_report().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_report_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");

        let mut report = EngineReport::new();
        report.add_resource(
            Urn::from("urn:stackflow:dev::webstack::test:Thing::a"),
            ResourceState::new("test:Thing").with_status(ResourceStatus::Created),
        );
        store.save_report(&report).await.unwrap();

        let loaded = store.load_report().await.unwrap().unwrap();
        assert_eq!(loaded.resources.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");

        let lock = store.acquire_lock().await.unwrap();
        assert!(matches!(
            store.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = store.acquire_lock().await.unwrap();
        drop(again);
        assert!(!store.lock_path().exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_has_single_winner() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.acquire_lock().await })
            })
            .collect();

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, CloudError::LockError(_)))
        );
    }

    #[tokio::test]
    async fn test_stale_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let store = HandoffStore::new(temp_dir.path(), "dev");
        store.ensure_stack_dir().await.unwrap();

        let stale = LockInfo {
            holder: "old-host".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(store.lock_path(), serde_json::to_string(&stale).unwrap()).unwrap();

        assert!(store.acquire_lock().await.is_ok());
    }
}
