//! In-memory ThreadRepository implementation

use async_trait::async_trait;
use bulletin_core::BulletinError;
use bulletin_core::chat::{Message, Thread, ThreadRepository};
use bulletin_core::error::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Thread store kept in process memory.
///
/// Used for ephemeral sessions (`--ephemeral`) and as a test backend.
#[derive(Default)]
pub struct InMemoryThreadRepository {
    threads: RwLock<HashMap<String, Thread>>,
}

impl InMemoryThreadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `threads`.
    pub fn with_threads(threads: impl IntoIterator<Item = Thread>) -> Self {
        Self {
            threads: RwLock::new(threads.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }
}

#[async_trait]
impl ThreadRepository for InMemoryThreadRepository {
    async fn list_all(&self) -> Result<Vec<Thread>> {
        let threads = self.threads.read().await;
        let mut all: Vec<Thread> = threads.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Thread>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn create(&self, thread_id: &str) -> Result<Thread> {
        let mut threads = self.threads.write().await;
        if threads.contains_key(thread_id) {
            return Err(BulletinError::already_exists("Thread", thread_id));
        }
        let thread = Thread::new(thread_id);
        threads.insert(thread_id.to_string(), thread.clone());
        Ok(thread)
    }

    async fn save_messages(
        &self,
        thread_id: &str,
        messages: &[Message],
        expected_revision: Option<u64>,
    ) -> Result<Thread> {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(thread_id)
            .ok_or_else(|| BulletinError::not_found("Thread", thread_id))?;
        thread.replace_messages(messages, expected_revision)?;
        Ok(thread.clone())
    }
}
