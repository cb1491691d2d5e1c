//! Thread repository trait.
//!
//! Defines the interface for thread persistence operations.

use super::message::Message;
use super::thread::Thread;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for thread persistence.
///
/// Decouples the chat logic from the concrete backend (hosted database,
/// TOML file, in-memory map).
///
/// # Implementation Notes
///
/// Implementations should:
/// - Bump `revision` by one on every successful `save_messages`
/// - Reject `create` for an id that already exists
/// - Replace the whole message list on save, never patch a sub-range
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Lists all stored threads.
    async fn list_all(&self) -> Result<Vec<Thread>>;

    /// Finds a thread by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Thread))`: Thread found
    /// - `Ok(None)`: Thread not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Creates an empty thread at revision 0.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a thread with this id is already stored.
    async fn create(&self, thread_id: &str) -> Result<Thread>;

    /// Replaces the message list of a thread.
    ///
    /// # Arguments
    ///
    /// * `thread_id` - The thread to write
    /// * `messages` - The complete new message list
    /// * `expected_revision` - When set, the write only succeeds if the stored
    ///   revision still matches
    ///
    /// # Returns
    ///
    /// The stored thread with its bumped revision.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the thread does not exist
    /// - `Conflict` if `expected_revision` does not match
    async fn save_messages(
        &self,
        thread_id: &str,
        messages: &[Message],
        expected_revision: Option<u64>,
    ) -> Result<Thread>;
}
