//! Application layer for Bulletin chat.
//!
//! Use cases that coordinate the thread store, the change feed and the
//! signed-in identity into a category chat session.

pub mod error;
pub mod session;
mod synchronizer;
pub mod thread_resolver;

pub use error::ChatError;
pub use session::{
    ChannelStatus, ChatSession, ChatView, ComposerView, MessageView, SubmitOutcome, ThreadView,
};
pub use thread_resolver::{ThreadDirectory, ThreadResolver};
