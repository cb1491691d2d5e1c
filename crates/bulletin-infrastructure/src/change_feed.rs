//! In-process change feed built on a tokio broadcast channel.

use async_trait::async_trait;
use bulletin_core::chat::{ChangeFeed, Subscription, ThreadUpdate};
use bulletin_core::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Broadcast channel buffer size for subscribers
const FEED_BUFFER: usize = 256;

/// Fan-out of thread updates to every live subscription.
///
/// All subscriptions share one broadcast channel; each `Subscription` filters
/// down to its thread id. Per-thread subscriber counts are tracked so callers
/// can observe that released subscriptions are really gone.
#[derive(Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ThreadUpdate>,
    subscribers: Arc<Mutex<HashMap<String, usize>>>,
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(FEED_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pushes an update to every subscriber of its thread.
    ///
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, update: ThreadUpdate) {
        tracing::trace!(
            "[ChangeFeed] publish thread={} revision={}",
            update.thread_id,
            update.revision
        );
        let _ = self.sender.send(update);
    }

    /// Number of live subscriptions for `thread_id`.
    pub fn subscriber_count(&self, thread_id: &str) -> usize {
        self.subscribers
            .lock()
            .map(|counts| counts.get(thread_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn subscribe(&self, thread_id: &str) -> Result<Subscription> {
        if let Ok(mut counts) = self.subscribers.lock() {
            *counts.entry(thread_id.to_string()).or_insert(0) += 1;
        }
        tracing::debug!("[ChangeFeed] subscribe thread={}", thread_id);

        let subscribers = Arc::clone(&self.subscribers);
        let key = thread_id.to_string();
        let subscription = Subscription::new(thread_id, self.sender.subscribe())
            .with_release_hook(move || {
                if let Ok(mut counts) = subscribers.lock()
                    && let Some(count) = counts.get_mut(&key)
                {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        counts.remove(&key);
                    }
                }
                tracing::debug!("[ChangeFeed] unsubscribe thread={}", key);
            });

        Ok(subscription)
    }
}
