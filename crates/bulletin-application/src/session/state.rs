//! Session-local chat state shared between the session and its sync task.

use bulletin_core::chat::{Composer, Message};
use tokio::sync::{Mutex, MutexGuard, watch};

/// State of the realtime channel for the active thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// No thread is active.
    Closed,
    /// Subscribed and receiving updates.
    Live,
    /// The feed ended; no reconnect is attempted.
    Dropped,
}

/// The locally cached copy of the selected thread.
#[derive(Debug, Clone)]
pub(crate) struct ActiveThread {
    pub id: String,
    pub generation: u64,
    pub revision: u64,
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub(crate) struct ChatState {
    pub thread_ids: Vec<String>,
    pub active: Option<ActiveThread>,
    pub composer: Composer,
    pub notice: Option<String>,
    pub channel: ChannelStatus,
    generation: u64,
}

impl ChatState {
    fn new() -> Self {
        Self {
            thread_ids: Vec::new(),
            active: None,
            composer: Composer::new(),
            notice: None,
            channel: ChannelStatus::Closed,
            generation: 0,
        }
    }

    /// Makes `thread_id` active under a fresh generation.
    ///
    /// The cached list starts empty at revision 0 until the initial read or
    /// the first push lands; the compose box is reset.
    pub fn begin_activation(&mut self, thread_id: &str) -> u64 {
        self.generation += 1;
        self.active = Some(ActiveThread {
            id: thread_id.to_string(),
            generation: self.generation,
            revision: 0,
            messages: Vec::new(),
        });
        if !self.thread_ids.iter().any(|id| id == thread_id) {
            self.thread_ids.push(thread_id.to_string());
        }
        self.composer.cancel_edit();
        self.notice = None;
        self.channel = ChannelStatus::Closed;
        self.generation
    }

    /// Drops the active thread. Results still in flight for it are ignored
    /// from now on.
    pub fn deactivate(&mut self) {
        self.generation += 1;
        self.active = None;
        self.composer.cancel_edit();
        self.channel = ChannelStatus::Closed;
    }

    /// Whether `generation` still identifies the active thread.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.generation == generation)
    }

    /// Replaces the cached list with a full-state snapshot.
    ///
    /// Ignored when `generation` is no longer current or when `revision` is
    /// older than what is already shown. Returns whether it was applied.
    pub fn apply_snapshot(&mut self, generation: u64, revision: u64, messages: Vec<Message>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.generation != generation {
            tracing::debug!(
                "[ChatState] Discarding snapshot for stale generation {} (active {})",
                generation,
                active.generation
            );
            return false;
        }
        if revision < active.revision {
            tracing::debug!(
                "[ChatState] Discarding revision {} of {}, showing {}",
                revision,
                active.id,
                active.revision
            );
            return false;
        }

        active.revision = revision;
        active.messages = messages;
        if self.composer.retain_target(&active.messages) {
            self.notice = Some("The message you were editing was removed".to_string());
        }
        true
    }
}

/// Chat state plus a change counter observers can wait on.
pub(crate) struct StateCell {
    state: Mutex<ChatState>,
    changes: watch::Sender<u64>,
}

impl StateCell {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::new(ChatState::new()),
            changes,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().await
    }

    /// Bumps the change counter.
    pub fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
