//! Repository decorator that feeds writes into the change feed.
//!
//! The hosted backend replicates every row update to realtime subscribers on
//! its own. Locally, this wrapper plays that role: each successful message
//! write is published as a full-state `ThreadUpdate`.

use crate::change_feed::BroadcastChangeFeed;
use async_trait::async_trait;
use bulletin_core::chat::{Message, Thread, ThreadRepository, ThreadUpdate};
use bulletin_core::error::Result;

pub struct NotifyingThreadRepository<R> {
    inner: R,
    feed: BroadcastChangeFeed,
}

impl<R: ThreadRepository> NotifyingThreadRepository<R> {
    pub fn new(inner: R, feed: BroadcastChangeFeed) -> Self {
        Self { inner, feed }
    }

    pub fn feed(&self) -> &BroadcastChangeFeed {
        &self.feed
    }
}

#[async_trait]
impl<R: ThreadRepository> ThreadRepository for NotifyingThreadRepository<R> {
    async fn list_all(&self) -> Result<Vec<Thread>> {
        self.inner.list_all().await
    }

    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.inner.find_by_id(thread_id).await
    }

    async fn create(&self, thread_id: &str) -> Result<Thread> {
        self.inner.create(thread_id).await
    }

    async fn save_messages(
        &self,
        thread_id: &str,
        messages: &[Message],
        expected_revision: Option<u64>,
    ) -> Result<Thread> {
        let saved = self
            .inner
            .save_messages(thread_id, messages, expected_revision)
            .await?;

        self.feed.publish(ThreadUpdate {
            thread_id: saved.id.clone(),
            messages: saved.messages.clone(),
            revision: saved.revision,
        });

        Ok(saved)
    }
}
