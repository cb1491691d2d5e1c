//! Chat session use case.
//!
//! Ties the thread resolver, the message synchronizer and the compose state
//! machine together behind the operations a chat screen needs.

use super::state::{ActiveThread, ChannelStatus, ChatState, StateCell};
use super::view::ChatView;
use crate::error::{ChatError, Result};
use crate::synchronizer::{MessageSynchronizer, SyncGuard};
use crate::thread_resolver::ThreadResolver;
use bulletin_core::BulletinError;
use bulletin_core::chat::{
    ChangeFeed, Message, MessageOp, Thread, ThreadRepository, label_from_thread_id,
};
use bulletin_core::config::ChatSettings;
use bulletin_core::identity::IdentityProvider;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// Result of a submit that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank draft; nothing was persisted.
    Ignored,
    /// A new message was appended.
    Sent,
    /// The message being edited was rewritten.
    Edited,
}

/// What an in-flight write targets, captured when it starts.
struct WriteTarget {
    thread_id: String,
    generation: u64,
    revision: u64,
    messages: Vec<Message>,
}

impl WriteTarget {
    fn of(active: &ActiveThread) -> Self {
        Self {
            thread_id: active.id.clone(),
            generation: active.generation,
            revision: active.revision,
            messages: active.messages.clone(),
        }
    }
}

/// One user's chat screen.
///
/// Local state changes only after the store acknowledged a write. Writes from
/// this session are serialized; a completion that arrives after the user
/// switched threads is discarded.
pub struct ChatSession {
    repository: Arc<dyn ThreadRepository>,
    identity: Arc<dyn IdentityProvider>,
    resolver: ThreadResolver,
    synchronizer: MessageSynchronizer,
    settings: ChatSettings,
    cell: Arc<StateCell>,
    sync: Mutex<Option<SyncGuard>>,
    write_lock: Mutex<()>,
}

impl ChatSession {
    pub fn new(
        repository: Arc<dyn ThreadRepository>,
        feed: Arc<dyn ChangeFeed>,
        identity: Arc<dyn IdentityProvider>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            resolver: ThreadResolver::new(repository.clone(), settings.thread_prefix.clone()),
            synchronizer: MessageSynchronizer::new(repository.clone(), feed),
            repository,
            identity,
            settings,
            cell: Arc::new(StateCell::new()),
            sync: Mutex::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the chat for an optional category label.
    ///
    /// With a label, its thread is resolved (created on first visit) and
    /// activated. On failure the session degrades to an empty thread list.
    pub async fn open(&self, category: Option<&str>) -> Result<()> {
        let directory = match self.resolver.resolve(category).await {
            Ok(directory) => directory,
            Err(e) => {
                tracing::warn!("[ChatSession] Could not resolve {:?}: {}", category, e);
                self.release_subscription().await;
                {
                    let mut state = self.cell.lock().await;
                    state.deactivate();
                    state.thread_ids.clear();
                    state.notice = Some(e.to_string());
                }
                self.cell.notify();
                return Err(e);
            }
        };

        {
            let mut state = self.cell.lock().await;
            state.thread_ids = directory.threads.iter().map(|t| t.id.clone()).collect();
        }
        self.cell.notify();

        match directory.active {
            Some(thread_id) => self.select_thread(&thread_id).await,
            None => Ok(()),
        }
    }

    /// Makes `thread_id` the active thread and starts synchronizing it.
    pub async fn select_thread(&self, thread_id: &str) -> Result<()> {
        let mut slot = self.sync.lock().await;
        if let Some(previous) = slot.take() {
            previous.shutdown().await;
        }

        let (generation, known) = {
            let mut state = self.cell.lock().await;
            let known = state.thread_ids.iter().any(|id| id == thread_id);
            (state.begin_activation(thread_id), known)
        };
        self.cell.notify();
        tracing::info!("[ChatSession] Selecting {} (generation {})", thread_id, generation);

        match self
            .synchronizer
            .activate(thread_id, generation, self.cell.clone())
            .await
        {
            Ok(guard) => {
                *slot = Some(guard);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("[ChatSession] Could not activate {}: {}", thread_id, e);
                {
                    let mut state = self.cell.lock().await;
                    if state.is_current(generation) {
                        state.deactivate();
                    }
                    if !known {
                        state.thread_ids.retain(|id| id != thread_id);
                    }
                    state.notice = Some(e.to_string());
                }
                self.cell.notify();
                Err(e)
            }
        }
    }

    /// Leaves the active thread and releases its subscription.
    pub async fn close(&self) {
        self.release_subscription().await;
        self.cell.lock().await.deactivate();
        self.cell.notify();
    }

    async fn release_subscription(&self) {
        if let Some(guard) = self.sync.lock().await.take() {
            guard.shutdown().await;
        }
    }

    /// Replaces the compose box contents.
    pub async fn set_draft(&self, text: impl Into<String>) {
        self.cell.lock().await.composer.set_draft(text);
        self.cell.notify();
    }

    /// Starts editing the message at `index`; the draft is pre-filled with
    /// its text.
    pub async fn request_edit(&self, index: usize) -> Result<()> {
        self.checked(|state, user| {
            let user = user.ok_or(ChatError::Unauthenticated)?;
            let active = state.active.as_ref().ok_or(ChatError::NoActiveThread)?;
            let message = owned_message_at(&active.messages, index, user)?.clone();
            state.composer.begin_edit(&message);
            Ok(())
        })
        .await?;

        self.cell.notify();
        Ok(())
    }

    /// Leaves edit mode and clears the draft.
    pub async fn cancel_edit(&self) {
        self.cell.lock().await.composer.cancel_edit();
        self.cell.notify();
    }

    /// Submits the draft: appends a new message, or rewrites the message
    /// being edited.
    ///
    /// A blank draft is ignored without touching the store. On failure the
    /// list, the draft and the edit state are left as they were.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let _write = self.write_lock.lock().await;

        let prepared = self
            .checked(|state, user| {
                let user = user.ok_or(ChatError::Unauthenticated)?;
                let active = state.active.as_ref().ok_or(ChatError::NoActiveThread)?;
                Ok(state
                    .composer
                    .prepare(user, Utc::now())
                    .map(|op| (op, WriteTarget::of(active))))
            })
            .await?;
        let Some((op, target)) = prepared else {
            return Ok(SubmitOutcome::Ignored);
        };

        let outcome = match op {
            MessageOp::Append(_) => SubmitOutcome::Sent,
            _ => SubmitOutcome::Edited,
        };

        match self.persist(&target, &op).await {
            Ok(thread) => {
                let mut state = self.cell.lock().await;
                if state.is_current(target.generation) {
                    state.apply_snapshot(target.generation, thread.revision, thread.messages);
                    state.composer.complete();
                    state.notice = None;
                } else {
                    tracing::debug!(
                        "[ChatSession] Discarding completion for {}, thread changed",
                        target.thread_id
                    );
                }
                drop(state);
                self.cell.notify();
                Ok(outcome)
            }
            Err(e) => Err(self.fail_write(&target, &op, e).await),
        }
    }

    /// Deletes the message at `index`.
    ///
    /// An edit of the same message is abandoned once the delete is
    /// acknowledged.
    pub async fn delete(&self, index: usize) -> Result<()> {
        let _write = self.write_lock.lock().await;

        let (op, target) = self
            .checked(|state, user| {
                let user = user.ok_or(ChatError::Unauthenticated)?;
                let active = state.active.as_ref().ok_or(ChatError::NoActiveThread)?;
                let message = owned_message_at(&active.messages, index, user)?;
                let op = MessageOp::Delete {
                    message_id: message.id.clone(),
                };
                Ok((op, WriteTarget::of(active)))
            })
            .await?;

        match self.persist(&target, &op).await {
            Ok(thread) => {
                let mut state = self.cell.lock().await;
                if state.is_current(target.generation) {
                    state.apply_snapshot(target.generation, thread.revision, thread.messages);
                    state.composer.forget(op.message_id());
                    state.notice = None;
                }
                drop(state);
                self.cell.notify();
                Ok(())
            }
            Err(e) => Err(self.fail_write(&target, &op, e).await),
        }
    }

    /// Applies `op` and writes the full list, re-reading and re-applying on
    /// revision conflicts.
    async fn persist(&self, target: &WriteTarget, op: &MessageOp) -> bulletin_core::error::Result<Thread> {
        let mut messages = target.messages.clone();
        let mut revision = target.revision;
        let mut retries = 0;

        loop {
            op.apply(&mut messages)?;
            match self
                .repository
                .save_messages(&target.thread_id, &messages, Some(revision))
                .await
            {
                Ok(thread) => return Ok(thread),
                Err(e) if e.is_conflict() && retries < self.settings.max_write_retries => {
                    retries += 1;
                    tracing::debug!(
                        "[ChatSession] {} on {}, retry {}/{}",
                        e,
                        target.thread_id,
                        retries,
                        self.settings.max_write_retries
                    );
                    let fresh = self
                        .repository
                        .find_by_id(&target.thread_id)
                        .await?
                        .ok_or_else(|| BulletinError::not_found("Thread", &target.thread_id))?;
                    messages = fresh.messages;
                    revision = fresh.revision;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Records a failed write and maps it for the caller.
    async fn fail_write(&self, target: &WriteTarget, op: &MessageOp, err: BulletinError) -> ChatError {
        let chat_err = if err.is_not_found_of("Message") {
            ChatError::MessageNotFound("it was removed by someone else".to_string())
        } else {
            ChatError::PersistFailure(err.to_string())
        };
        tracing::warn!("[ChatSession] Write to {} failed: {}", target.thread_id, err);

        let mut state = self.cell.lock().await;
        if state.is_current(target.generation) {
            if matches!(chat_err, ChatError::MessageNotFound(_)) {
                state.composer.forget(op.message_id());
            }
            state.notice = Some(chat_err.to_string());
        }
        drop(state);
        self.cell.notify();

        chat_err
    }

    /// Runs `check` under the state lock with the signed-in user.
    ///
    /// A rejection is also recorded as the notice, like every other failure
    /// the session reports.
    async fn checked<T>(
        &self,
        check: impl FnOnce(&mut ChatState, Option<&str>) -> Result<T>,
    ) -> Result<T> {
        let user = self.identity.current_user();
        let mut state = self.cell.lock().await;
        let checked = check(&mut *state, user.as_deref());
        if let Err(e) = &checked {
            tracing::debug!("[ChatSession] Rejected: {}", e);
            state.notice = Some(e.to_string());
            drop(state);
            self.cell.notify();
        }
        checked
    }

    /// Render-ready snapshot of the chat.
    pub async fn view(&self) -> ChatView {
        let user = self.identity.current_user();
        let state = self.cell.lock().await;
        ChatView::build(&state, user.as_deref(), &self.settings.thread_prefix)
    }

    /// Receiver whose value changes whenever anything visible changed.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.cell.subscribe()
    }

    /// Messages of the active thread, in display order.
    pub async fn messages(&self) -> Vec<Message> {
        self.cell
            .lock()
            .await
            .active
            .as_ref()
            .map(|a| a.messages.clone())
            .unwrap_or_default()
    }

    pub async fn active_thread_id(&self) -> Option<String> {
        self.cell.lock().await.active.as_ref().map(|a| a.id.clone())
    }

    pub async fn thread_ids(&self) -> Vec<String> {
        self.cell.lock().await.thread_ids.clone()
    }

    /// Category labels of the known threads.
    pub async fn thread_labels(&self) -> Vec<String> {
        self.cell
            .lock()
            .await
            .thread_ids
            .iter()
            .map(|id| label_from_thread_id(&self.settings.thread_prefix, id).to_string())
            .collect()
    }

    pub async fn draft(&self) -> String {
        self.cell.lock().await.composer.draft().to_string()
    }

    pub async fn editing_id(&self) -> Option<String> {
        self.cell
            .lock()
            .await
            .composer
            .editing_id()
            .map(str::to_string)
    }

    pub async fn notice(&self) -> Option<String> {
        self.cell.lock().await.notice.clone()
    }

    /// Returns and clears the transient notice.
    pub async fn take_notice(&self) -> Option<String> {
        let notice = self.cell.lock().await.notice.take();
        if notice.is_some() {
            self.cell.notify();
        }
        notice
    }

    pub async fn channel_status(&self) -> ChannelStatus {
        self.cell.lock().await.channel
    }

    /// Thread currently held by the synchronizer, if any.
    pub async fn subscribed_thread(&self) -> Option<String> {
        self.sync
            .lock()
            .await
            .as_ref()
            .map(|guard| guard.thread_id().to_string())
    }
}

fn owned_message_at<'a>(messages: &'a [Message], index: usize, user: &str) -> Result<&'a Message> {
    let message = messages
        .get(index)
        .ok_or_else(|| ChatError::MessageNotFound(format!("no message at position {}", index)))?;
    if !message.is_from(user) {
        return Err(ChatError::NotOwner);
    }
    Ok(message)
}
