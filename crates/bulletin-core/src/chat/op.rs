//! Identity-keyed message mutations.
//!
//! A `MessageOp` addresses its target by message id, never by position, so it
//! can be re-applied to a freshly read list after a concurrent write without
//! hitting the wrong message.

use super::message::Message;
use crate::error::{BulletinError, Result};
use chrono::{DateTime, Utc};

/// A single mutation of a thread's message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOp {
    /// Append a new message to the end of the list.
    Append(Message),
    /// Replace the text of an existing message and stamp the edit time.
    Edit {
        message_id: String,
        text: String,
        edited_at: DateTime<Utc>,
    },
    /// Remove a message.
    Delete { message_id: String },
}

impl MessageOp {
    /// Id of the message this operation targets.
    pub fn message_id(&self) -> &str {
        match self {
            Self::Append(message) => &message.id,
            Self::Edit { message_id, .. } | Self::Delete { message_id } => message_id,
        }
    }

    /// Applies this operation to `messages` in place.
    ///
    /// Append and delete are idempotent: appending an id that is already
    /// present and deleting an id that is gone are both no-ops. Editing a
    /// message that no longer exists fails with `NotFound`.
    pub fn apply(&self, messages: &mut Vec<Message>) -> Result<()> {
        match self {
            Self::Append(message) => {
                if !messages.iter().any(|m| m.id == message.id) {
                    messages.push(message.clone());
                }
                Ok(())
            }
            Self::Edit {
                message_id,
                text,
                edited_at,
            } => {
                let target = messages
                    .iter_mut()
                    .find(|m| &m.id == message_id)
                    .ok_or_else(|| BulletinError::not_found("Message", message_id.clone()))?;
                target.text = text.clone();
                target.edited_at = Some(*edited_at);
                Ok(())
            }
            Self::Delete { message_id } => {
                messages.retain(|m| &m.id != message_id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Message> {
        let now = Utc::now();
        vec![
            Message::new("alice", "first", now),
            Message::new("bob", "second", now),
            Message::new("alice", "third", now),
        ]
    }

    #[test]
    fn test_append_preserves_order() {
        let mut messages = sample();
        let m = Message::new("carol", "fourth", Utc::now());
        MessageOp::Append(m.clone()).apply(&mut messages).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3], m);
    }

    #[test]
    fn test_append_is_idempotent() {
        let mut messages = sample();
        let op = MessageOp::Append(Message::new("carol", "once", Utc::now()));
        op.apply(&mut messages).unwrap();
        op.apply(&mut messages).unwrap();
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_edit_keeps_sender_and_created_at() {
        let mut messages = sample();
        let before = messages[1].clone();
        let at = Utc::now();
        MessageOp::Edit {
            message_id: before.id.clone(),
            text: "changed".to_string(),
            edited_at: at,
        }
        .apply(&mut messages)
        .unwrap();

        let after = &messages[1];
        assert_eq!(after.text, "changed");
        assert_eq!(after.edited_at, Some(at));
        assert_eq!(after.sender, before.sender);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn test_edit_follows_identity_after_shift() {
        let mut messages = sample();
        let target = messages[2].id.clone();
        // Another writer removed an earlier message.
        messages.remove(0);

        MessageOp::Edit {
            message_id: target.clone(),
            text: "still third".to_string(),
            edited_at: Utc::now(),
        }
        .apply(&mut messages)
        .unwrap();

        assert_eq!(messages[0].text, "second");
        assert_eq!(messages[1].id, target);
        assert_eq!(messages[1].text, "still third");
    }

    #[test]
    fn test_edit_missing_message_fails() {
        let mut messages = sample();
        let err = MessageOp::Edit {
            message_id: "gone".to_string(),
            text: "x".to_string(),
            edited_at: Utc::now(),
        }
        .apply(&mut messages)
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_shifts_following_messages() {
        let mut messages = sample();
        let next = messages[2].clone();
        MessageOp::Delete {
            message_id: messages[1].id.clone(),
        }
        .apply(&mut messages)
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], next);
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let mut messages = sample();
        let op = MessageOp::Delete {
            message_id: messages[0].id.clone(),
        };
        op.apply(&mut messages).unwrap();
        op.apply(&mut messages).unwrap();
        assert_eq!(messages.len(), 2);
    }
}
