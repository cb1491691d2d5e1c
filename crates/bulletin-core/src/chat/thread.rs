//! Thread domain model.

use super::message::Message;
use crate::error::{BulletinError, Result};
use serde::{Deserialize, Serialize};

/// Prefix used to derive a thread id from a category label.
pub const DEFAULT_THREAD_PREFIX: &str = "category-";

/// Derives the thread id for a category label.
///
/// # Examples
///
/// ```
/// use bulletin_core::chat::thread_id_for;
///
/// assert_eq!(thread_id_for("category-", "electronics"), "category-electronics");
/// ```
pub fn thread_id_for(prefix: &str, label: &str) -> String {
    format!("{}{}", prefix, label)
}

/// Recovers the category label from a thread id.
///
/// Ids without the prefix are returned unchanged.
pub fn label_from_thread_id<'a>(prefix: &str, thread_id: &'a str) -> &'a str {
    thread_id.strip_prefix(prefix).unwrap_or(thread_id)
}

/// A per-category conversation.
///
/// `messages` is always the full list; every write replaces it. `revision`
/// is bumped by the store on each successful message write.
///
/// Messages stored without an id are given one derived from the thread id,
/// their position, sender and creation time, so every load of the same
/// stored list yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredThread")]
pub struct Thread {
    pub id: String,
    pub revision: u64,
    pub messages: Vec<Message>,
}

/// Row shape of a thread as read from a store.
#[derive(Deserialize)]
struct StoredThread {
    id: String,
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    messages: Vec<Message>,
}

impl From<StoredThread> for Thread {
    fn from(stored: StoredThread) -> Self {
        let mut thread = Thread {
            id: stored.id,
            revision: stored.revision,
            messages: stored.messages,
        };
        thread.assign_missing_ids();
        thread
    }
}

fn derived_message_id(thread_id: &str, position: usize, message: &Message) -> String {
    let key = format!(
        "{}/{}/{}/{}",
        thread_id,
        position,
        message.sender,
        message.created_at.to_rfc3339()
    );
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

impl Thread {
    /// Creates an empty thread at revision 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: 0,
            messages: Vec::new(),
        }
    }

    /// Gives every message with a blank id a deterministic one.
    ///
    /// Returns how many ids were assigned.
    pub fn assign_missing_ids(&mut self) -> usize {
        let mut assigned = 0;
        for (position, message) in self.messages.iter_mut().enumerate() {
            if message.id.trim().is_empty() {
                message.id = derived_message_id(&self.id, position, message);
                assigned += 1;
            }
        }
        if assigned > 0 {
            tracing::debug!("[Thread] Assigned {} missing message ids in {}", assigned, self.id);
        }
        assigned
    }

    /// Display label for this thread.
    pub fn label<'a>(&'a self, prefix: &str) -> &'a str {
        label_from_thread_id(prefix, &self.id)
    }

    /// Replaces the message list and bumps the revision.
    ///
    /// Store implementations call this for every write so that revision
    /// handling is identical across backends.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when `expected_revision` is set and differs from the
    /// current revision; the thread is left untouched.
    pub fn replace_messages(
        &mut self,
        messages: &[Message],
        expected_revision: Option<u64>,
    ) -> Result<()> {
        if let Some(expected) = expected_revision
            && expected != self.revision
        {
            return Err(BulletinError::Conflict {
                id: self.id.clone(),
                expected,
                actual: self.revision,
            });
        }
        self.messages = messages.to_vec();
        self.revision += 1;
        Ok(())
    }

    /// Index of the message with the given id.
    pub fn position_of(&self, message_id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }
}
