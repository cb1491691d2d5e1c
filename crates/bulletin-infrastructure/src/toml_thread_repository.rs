//! TOML-based ThreadRepository implementation

use crate::paths::BulletinPaths;
use crate::storage::{AtomicTomlFile, StorageError};
use anyhow::Context;
use async_trait::async_trait;
use bulletin_core::BulletinError;
use bulletin_core::chat::{Message, Thread, ThreadRepository};
use bulletin_core::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// On-disk layout of `threads.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ThreadsDocument {
    #[serde(default, rename = "thread")]
    threads: Vec<Thread>,
}

/// A repository storing every thread in one TOML document.
///
/// ```text
/// [[thread]]
/// id = "category-electronics"
/// revision = 2
///
/// [[thread.messages]]
/// id = "..."
/// sender = "alice@example.edu"
/// text = "Hello"
/// createdAt = "2024-05-01T10:00:00Z"
/// ```
///
/// Writes go through `AtomicTomlFile::update`, so the revision check and the
/// write happen under one exclusive file lock.
pub struct TomlThreadRepository {
    file: Arc<AtomicTomlFile<ThreadsDocument>>,
}

impl TomlThreadRepository {
    /// Creates a repository backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path.as_ref().to_path_buf())),
        }
    }

    /// Creates a repository at the default location (~/.config/bulletin/threads.toml).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be determined.
    pub fn default_location() -> anyhow::Result<Self> {
        let path = BulletinPaths::default()
            .threads_file()
            .context("Failed to resolve threads file")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Runs blocking file work off the async runtime.
    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicTomlFile<ThreadsDocument>) -> std::result::Result<R, StorageError>
            + Send
            + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| BulletinError::internal(format!("storage task failed: {}", e)))?
            .map_err(BulletinError::from)
    }
}

#[async_trait]
impl ThreadRepository for TomlThreadRepository {
    async fn list_all(&self) -> Result<Vec<Thread>> {
        self.blocking(|file| Ok(file.load()?.unwrap_or_default().threads))
            .await
    }

    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Thread>> {
        let thread_id = thread_id.to_string();
        self.blocking(move |file| {
            Ok(file
                .load()?
                .unwrap_or_default()
                .threads
                .into_iter()
                .find(|t| t.id == thread_id))
        })
        .await
    }

    async fn create(&self, thread_id: &str) -> Result<Thread> {
        let thread_id = thread_id.to_string();
        let created = self
            .blocking(move |file| {
                file.update(ThreadsDocument::default(), |doc| {
                    if doc.threads.iter().any(|t| t.id == thread_id) {
                        return Err(StorageError::Rejected(BulletinError::already_exists(
                            "Thread", &thread_id,
                        )));
                    }
                    let thread = Thread::new(&thread_id);
                    doc.threads.push(thread.clone());
                    Ok(thread)
                })
            })
            .await?;

        tracing::debug!("[TomlThreadRepository] Created thread {}", created.id);
        Ok(created)
    }

    async fn save_messages(
        &self,
        thread_id: &str,
        messages: &[Message],
        expected_revision: Option<u64>,
    ) -> Result<Thread> {
        let thread_id = thread_id.to_string();
        let messages = messages.to_vec();
        let saved = self
            .blocking(move |file| {
                file.update(ThreadsDocument::default(), |doc| {
                    let thread = doc
                        .threads
                        .iter_mut()
                        .find(|t| t.id == thread_id)
                        .ok_or_else(|| {
                            StorageError::Rejected(BulletinError::not_found("Thread", &thread_id))
                        })?;
                    thread
                        .replace_messages(&messages, expected_revision)
                        .map_err(StorageError::Rejected)?;
                    Ok(thread.clone())
                })
            })
            .await?;

        tracing::debug!(
            "[TomlThreadRepository] Saved thread {} at revision {} ({} messages)",
            saved.id,
            saved.revision,
            saved.messages.len()
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_default_location_is_under_config_dir() {
        // Headless CI machines may have no config dir at all.
        if let Ok(repo) = TomlThreadRepository::default_location() {
            assert!(repo.path().ends_with("bulletin/threads.toml"));
        }
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlThreadRepository::new(temp_dir.path().join("threads.toml"));
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(repo.find_by_id("category-books").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_messages_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("threads.toml");

        let mut edited = Message::new("alice@example.edu", "Hello world", Utc::now());
        edited.edited_at = Some(Utc::now());
        let messages = vec![edited, Message::new("bob@example.edu", "Hi", Utc::now())];

        {
            let repo = TomlThreadRepository::new(&path);
            repo.create("category-electronics").await.unwrap();
            repo.save_messages("category-electronics", &messages, Some(0))
                .await
                .unwrap();
        }

        let reopened = TomlThreadRepository::new(&path);
        let thread = reopened
            .find_by_id("category-electronics")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thread.revision, 1);
        assert_eq!(thread.messages, messages);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlThreadRepository::new(temp_dir.path().join("threads.toml"));
        repo.create("category-books").await.unwrap();

        let err = repo.create("category-books").await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected_and_not_written() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlThreadRepository::new(temp_dir.path().join("threads.toml"));
        repo.create("category-books").await.unwrap();
        repo.save_messages("category-books", &[], Some(0)).await.unwrap();

        let late = vec![Message::new("alice", "late", Utc::now())];
        let err = repo
            .save_messages("category-books", &late, Some(0))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let thread = repo.find_by_id("category-books").await.unwrap().unwrap();
        assert_eq!(thread.revision, 1);
        assert!(thread.messages.is_empty());
    }

    #[tokio::test]
    async fn test_save_unknown_thread() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlThreadRepository::new(temp_dir.path().join("threads.toml"));
        let err = repo
            .save_messages("category-none", &[], None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
