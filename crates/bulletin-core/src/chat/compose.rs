//! Compose/edit state machine.
//!
//! Tracks the compose box contents and whether a submit appends a new message
//! or rewrites an existing one. It performs no I/O: `prepare` turns the
//! current state into a `MessageOp`, and the caller reports back with
//! `complete` once the store acknowledged it.

use super::message::Message;
use super::op::MessageOp;
use chrono::{DateTime, Utc};

/// What a submit does with the draft.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposeMode {
    /// Composing a new message.
    #[default]
    Idle,
    /// Rewriting the message with this id in place.
    Editing { message_id: String },
}

/// Compose box state.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    mode: ComposeMode,
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ComposeMode {
        &self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Id of the message being edited, if any.
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            ComposeMode::Editing { message_id } => Some(message_id),
            ComposeMode::Idle => None,
        }
    }

    /// Switches to editing `message`, pre-filling the draft with its text.
    pub fn begin_edit(&mut self, message: &Message) {
        self.mode = ComposeMode::Editing {
            message_id: message.id.clone(),
        };
        self.draft = message.text.clone();
    }

    /// Leaves edit mode and clears the draft.
    pub fn cancel_edit(&mut self) {
        self.reset();
    }

    /// Builds the operation a submit would persist.
    ///
    /// Returns `None` when the draft is empty or whitespace only.
    pub fn prepare(&self, sender: &str, now: DateTime<Utc>) -> Option<MessageOp> {
        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }

        Some(match &self.mode {
            ComposeMode::Idle => MessageOp::Append(Message::new(sender, text, now)),
            ComposeMode::Editing { message_id } => MessageOp::Edit {
                message_id: message_id.clone(),
                text: text.to_string(),
                edited_at: now,
            },
        })
    }

    /// Marks the prepared operation as acknowledged.
    pub fn complete(&mut self) {
        self.reset();
    }

    /// Abandons the edit if it targets `message_id`.
    ///
    /// Returns `true` when the edit was abandoned.
    pub fn forget(&mut self, message_id: &str) -> bool {
        if self.editing_id() == Some(message_id) {
            self.reset();
            return true;
        }
        false
    }

    /// Abandons the edit if its target is no longer in `messages`.
    pub fn retain_target(&mut self, messages: &[Message]) -> bool {
        match self.editing_id() {
            Some(id) if !messages.iter().any(|m| m.id == id) => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.mode = ComposeMode::Idle;
        self.draft.clear();
    }
}
