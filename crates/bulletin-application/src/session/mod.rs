//! The chat screen's session: state, view model and use case.

mod chat_session;
pub(crate) mod state;
mod view;

pub use chat_session::{ChatSession, SubmitOutcome};
pub use state::ChannelStatus;
pub use view::{ChatView, ComposerView, MessageView, ThreadView};
