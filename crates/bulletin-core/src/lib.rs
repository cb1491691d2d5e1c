//! Domain layer for the Bulletin category chat.
//!
//! Holds the thread/message model, the persistence and change feed seams,
//! the identity seam, configuration types and the compose state machine.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;

// Re-export common error type
pub use error::BulletinError;
