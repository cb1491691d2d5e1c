//! Realtime change feed contract.

use super::message::Message;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

/// Full-state payload pushed after every write to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadUpdate {
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub revision: u64,
}

/// A push channel delivering thread updates to interested subscribers.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribes to updates of a single thread.
    ///
    /// The returned handle only yields updates whose `thread_id` matches.
    /// Dropping it unsubscribes.
    async fn subscribe(&self, thread_id: &str) -> Result<Subscription>;
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A live subscription to one thread's updates.
///
/// Released on drop: the release hook registered by the feed runs exactly
/// once, whichever path drops the handle.
pub struct Subscription {
    thread_id: String,
    receiver: broadcast::Receiver<ThreadUpdate>,
    on_release: Option<ReleaseHook>,
}

impl Subscription {
    /// Wraps a broadcast receiver, filtering it down to `thread_id`.
    pub fn new(thread_id: impl Into<String>, receiver: broadcast::Receiver<ThreadUpdate>) -> Self {
        Self {
            thread_id: thread_id.into(),
            receiver,
            on_release: None,
        }
    }

    /// Registers a hook run when the subscription is dropped.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Waits for the next update of this thread.
    ///
    /// Returns `None` once the feed has shut down. Updates missed because the
    /// receiver lagged are skipped; every update carries the full list, so the
    /// next one received supersedes them.
    pub async fn recv(&mut self) -> Option<ThreadUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) if update.thread_id == self.thread_id => return Some(update),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "[Subscription] thread={} lagged, skipped {} updates",
                        self.thread_id,
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn update(thread_id: &str, revision: u64) -> ThreadUpdate {
        ThreadUpdate {
            thread_id: thread_id.to_string(),
            messages: Vec::new(),
            revision,
        }
    }

    #[tokio::test]
    async fn test_recv_filters_other_threads() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new("category-books", rx);

        tx.send(update("category-cars", 1)).unwrap();
        tx.send(update("category-books", 2)).unwrap();

        let got = sub.recv().await.unwrap();
        assert_eq!(got.thread_id, "category-books");
        assert_eq!(got.revision, 2);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new("category-books", rx);
        drop(tx);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_catches_up() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = Subscription::new("category-books", rx);
        for revision in 1..=5 {
            tx.send(update("category-books", revision)).unwrap();
        }
        let got = sub.recv().await.unwrap();
        assert_eq!(got.revision, 4);
    }

    #[test]
    fn test_release_hook_runs_on_drop() {
        let (_tx, rx) = broadcast::channel::<ThreadUpdate>(1);
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let sub = Subscription::new("category-books", rx)
            .with_release_hook(move || flag.store(true, Ordering::SeqCst));
        assert!(!released.load(Ordering::SeqCst));
        drop(sub);
        assert!(released.load(Ordering::SeqCst));
    }
}
