//! Resolves a category label to its chat thread, creating it on first visit.

use crate::error::{ChatError, Result};
use bulletin_core::chat::{Thread, ThreadRepository, thread_id_for};
use std::sync::Arc;

/// Outcome of resolving the entry context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDirectory {
    /// Every known thread sorted by id, including one created during
    /// resolution.
    pub threads: Vec<Thread>,
    /// Thread to select, if a category label was given.
    pub active: Option<String>,
}

/// Ensures exactly one thread exists per category label.
pub struct ThreadResolver {
    repository: Arc<dyn ThreadRepository>,
    prefix: String,
}

impl ThreadResolver {
    pub fn new(repository: Arc<dyn ThreadRepository>, prefix: impl Into<String>) -> Self {
        Self {
            repository,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Loads all threads and selects (creating if needed) the one for
    /// `category`.
    ///
    /// A missing or blank label selects nothing. If another session creates
    /// the same thread between our read and our create, the existing thread
    /// is adopted.
    ///
    /// # Errors
    ///
    /// `ThreadUnavailable` when the store cannot be read or written.
    pub async fn resolve(&self, category: Option<&str>) -> Result<ThreadDirectory> {
        let mut threads = self
            .repository
            .list_all()
            .await
            .map_err(|e| ChatError::ThreadUnavailable(e.to_string()))?;
        threads.sort_by(|a, b| a.id.cmp(&b.id));

        let Some(label) = category.map(str::trim).filter(|l| !l.is_empty()) else {
            tracing::debug!("[ThreadResolver] No category given, {} threads", threads.len());
            return Ok(ThreadDirectory {
                threads,
                active: None,
            });
        };

        let thread_id = thread_id_for(&self.prefix, label);
        if !threads.iter().any(|t| t.id == thread_id) {
            let thread = self.create_or_adopt(&thread_id).await?;
            threads.push(thread);
            threads.sort_by(|a, b| a.id.cmp(&b.id));
        }

        Ok(ThreadDirectory {
            threads,
            active: Some(thread_id),
        })
    }

    async fn create_or_adopt(&self, thread_id: &str) -> Result<Thread> {
        match self.repository.create(thread_id).await {
            Ok(thread) => {
                tracing::info!("[ThreadResolver] Created thread {}", thread_id);
                Ok(thread)
            }
            Err(e) if e.is_already_exists() => {
                tracing::info!(
                    "[ThreadResolver] Thread {} created concurrently, adopting it",
                    thread_id
                );
                self.repository
                    .find_by_id(thread_id)
                    .await
                    .map_err(|e| ChatError::ThreadUnavailable(e.to_string()))?
                    .ok_or_else(|| {
                        ChatError::ThreadUnavailable(format!("{} vanished after create", thread_id))
                    })
            }
            Err(e) => {
                tracing::warn!("[ThreadResolver] Failed to create {}: {}", thread_id, e);
                Err(ChatError::ThreadUnavailable(e.to_string()))
            }
        }
    }
}
