//! Chat message type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A single entry in a thread's message list.
///
/// Field names serialize in camelCase (`createdAt`, `editedAt`) to match the
/// stored row shape. Rows written before messages carried an id deserialize
/// with an empty `id`; the owning `Thread` fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Stable identifier assigned at creation.
    #[serde(default)]
    pub id: String,
    /// Identity of the authoring user (opaque).
    pub sender: String,
    /// Message body, stored trimmed.
    pub text: String,
    /// Creation time; never changes afterwards.
    pub created_at: DateTime<Utc>,
    /// Last edit time; `None` until the text is changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates a new message with a fresh id.
    pub fn new(sender: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            sender: sender.into(),
            text: text.into(),
            created_at,
            edited_at: None,
        }
    }

    /// Whether the text was modified after creation.
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Whether `user` authored this message.
    pub fn is_from(&self, user: &str) -> bool {
        self.sender == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_unedited() {
        let msg = Message::new("alice", "Hello", Utc::now());
        assert!(!msg.is_edited());
        assert!(msg.is_from("alice"));
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let a = Message::new("alice", "one", now);
        let b = Message::new("alice", "one", now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_legacy_row_without_id_is_left_blank() {
        let json = r#"{"sender":"bob","text":"hi","createdAt":"2024-05-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.id.is_empty());
        assert_eq!(msg.sender, "bob");
        assert!(msg.edited_at.is_none());
    }

    #[test]
    fn test_camel_case_fields() {
        let mut msg = Message::new("alice", "Hello", Utc::now());
        msg.edited_at = Some(Utc::now());
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("editedAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
