//! Render-ready snapshot of the chat.

use super::state::{ChannelStatus, ChatState};
use bulletin_core::chat::{ComposeMode, label_from_thread_id};

/// What the chat screen should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatView {
    /// No thread selected; lists the known threads.
    Placeholder { threads: Vec<String> },
    /// A selected thread.
    Thread(ThreadView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub thread_id: String,
    /// Category label shown in the header.
    pub label: String,
    pub messages: Vec<MessageView>,
    /// `None` when nobody is signed in; the screen shows a sign-in prompt.
    pub composer: Option<ComposerView>,
    pub notice: Option<String>,
    pub channel: ChannelStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub index: usize,
    pub sender: String,
    pub text: String,
    /// Local `HH:MM` of creation.
    pub time: String,
    pub edited: bool,
    /// Authored by the current user, so edit/delete are offered.
    pub is_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerView {
    pub draft: String,
    /// Position of the message being edited.
    pub editing_index: Option<usize>,
}

impl ComposerView {
    pub fn submit_label(&self) -> &'static str {
        if self.editing_index.is_some() {
            "Update"
        } else {
            "Send"
        }
    }
}

impl ChatView {
    pub(crate) fn build(state: &ChatState, user: Option<&str>, prefix: &str) -> Self {
        let Some(active) = &state.active else {
            return ChatView::Placeholder {
                threads: state
                    .thread_ids
                    .iter()
                    .map(|id| label_from_thread_id(prefix, id).to_string())
                    .collect(),
            };
        };

        let messages = active
            .messages
            .iter()
            .enumerate()
            .map(|(index, m)| MessageView {
                index,
                sender: m.sender.clone(),
                text: m.text.clone(),
                time: m
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M")
                    .to_string(),
                edited: m.is_edited(),
                is_mine: user.is_some_and(|u| m.is_from(u)),
            })
            .collect();

        let composer = user.map(|_| ComposerView {
            draft: state.composer.draft().to_string(),
            editing_index: match state.composer.mode() {
                ComposeMode::Editing { message_id } => {
                    active.messages.iter().position(|m| &m.id == message_id)
                }
                ComposeMode::Idle => None,
            },
        });

        ChatView::Thread(ThreadView {
            thread_id: active.id.clone(),
            label: label_from_thread_id(prefix, &active.id).to_string(),
            messages,
            composer,
            notice: state.notice.clone(),
            channel: state.channel,
        })
    }
}
