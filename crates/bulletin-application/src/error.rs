//! Errors surfaced by the chat session.

use thiserror::Error;

/// Failures of a chat operation, as seen by the view.
///
/// None of these escape the session as panics; the view degrades to a
/// placeholder, a sign-in prompt, or a transient notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Listing, reading or creating the thread failed.
    #[error("Thread unavailable: {0}")]
    ThreadUnavailable(String),

    /// A send/edit/delete write was not acknowledged by the store.
    #[error("Could not save change: {0}")]
    PersistFailure(String),

    /// The realtime subscription ended; the list is frozen until reopened.
    #[error("Live updates stopped for thread '{0}'")]
    ChannelDropped(String),

    /// Nobody is signed in.
    #[error("Sign in to take part in the chat")]
    Unauthenticated,

    /// No thread is selected.
    #[error("No chat is selected")]
    NoActiveThread,

    /// The addressed message does not exist (any more).
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Only the author may edit or delete a message.
    #[error("Only the author can change this message")]
    NotOwner,
}

pub type Result<T> = std::result::Result<T, ChatError>;
