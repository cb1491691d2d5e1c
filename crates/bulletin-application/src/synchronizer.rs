//! Keeps the cached message list of the active thread in step with the store.

use crate::error::{ChatError, Result};
use crate::session::state::{ChannelStatus, StateCell};
use bulletin_core::chat::{ChangeFeed, Subscription, ThreadRepository};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Scoped handle on one thread activation.
///
/// Dropping it cancels the forwarding task, which in turn drops the feed
/// subscription. `shutdown` does the same and waits until the subscription
/// is actually released.
pub(crate) struct SyncGuard {
    thread_id: String,
    cancel: Option<DropGuard>,
    handle: Option<JoinHandle<()>>,
}

impl SyncGuard {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub async fn shutdown(mut self) {
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        tracing::debug!("[MessageSynchronizer] Released {}", self.thread_id);
    }
}

/// Loads a thread once, then applies its change feed pushes.
pub(crate) struct MessageSynchronizer {
    repository: Arc<dyn ThreadRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl MessageSynchronizer {
    pub fn new(repository: Arc<dyn ThreadRepository>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { repository, feed }
    }

    /// Starts synchronizing `thread_id` for the activation `generation`.
    ///
    /// Subscribes before the initial read so no write between the two is
    /// missed; revision ordering discards whichever of the two is older.
    pub async fn activate(
        &self,
        thread_id: &str,
        generation: u64,
        cell: Arc<StateCell>,
    ) -> Result<SyncGuard> {
        let subscription = self
            .feed
            .subscribe(thread_id)
            .await
            .map_err(|e| ChatError::ThreadUnavailable(e.to_string()))?;

        let thread = self
            .repository
            .find_by_id(thread_id)
            .await
            .map_err(|e| ChatError::ThreadUnavailable(e.to_string()))?
            .ok_or_else(|| ChatError::ThreadUnavailable(format!("{} does not exist", thread_id)))?;

        {
            let mut state = cell.lock().await;
            state.apply_snapshot(generation, thread.revision, thread.messages);
            if state.is_current(generation) {
                state.channel = ChannelStatus::Live;
            }
        }
        cell.notify();

        let token = CancellationToken::new();
        let handle = tokio::spawn(forward_updates(
            subscription,
            generation,
            cell,
            token.clone(),
        ));

        tracing::debug!(
            "[MessageSynchronizer] Activated {} (generation {})",
            thread_id,
            generation
        );

        Ok(SyncGuard {
            thread_id: thread_id.to_string(),
            cancel: Some(token.drop_guard()),
            handle: Some(handle),
        })
    }
}

async fn forward_updates(
    mut subscription: Subscription,
    generation: u64,
    cell: Arc<StateCell>,
    token: CancellationToken,
) {
    let thread_id = subscription.thread_id().to_string();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            update = subscription.recv() => match update {
                Some(update) => {
                    let applied = cell
                        .lock()
                        .await
                        .apply_snapshot(generation, update.revision, update.messages);
                    if applied {
                        cell.notify();
                    }
                }
                None => {
                    tracing::warn!("[MessageSynchronizer] Change feed closed for {}", thread_id);
                    let mut state = cell.lock().await;
                    if state.is_current(generation) {
                        state.channel = ChannelStatus::Dropped;
                        state.notice = Some(ChatError::ChannelDropped(thread_id.clone()).to_string());
                    }
                    drop(state);
                    cell.notify();
                    break;
                }
            },
        }
    }
}
