//! Chat domain module.
//!
//! This module contains the category chat model, the persistence and change
//! feed contracts, and the compose/edit state machine.
//!
//! # Module Structure
//!
//! - `message`: A single chat entry (`Message`)
//! - `thread`: A per-category conversation (`Thread`) and id derivation
//! - `op`: Identity-keyed mutations applied to a message list (`MessageOp`)
//! - `repository`: Repository trait for thread persistence
//! - `feed`: Change feed contract and the scoped `Subscription`
//! - `compose`: Compose/edit state machine (`Composer`)
//!
//! # Usage
//!
//! ```ignore
//! use bulletin_core::chat::{Message, Thread, ThreadRepository, ChangeFeed};
//! use bulletin_core::chat::{Composer, ComposeMode, MessageOp};
//! ```

mod compose;
mod feed;
mod message;
mod op;
mod repository;
mod thread;

// Re-export public API
pub use compose::{ComposeMode, Composer};
pub use feed::{ChangeFeed, Subscription, ThreadUpdate};
pub use message::Message;
pub use op::MessageOp;
pub use repository::ThreadRepository;
pub use thread::{DEFAULT_THREAD_PREFIX, Thread, label_from_thread_id, thread_id_for};
