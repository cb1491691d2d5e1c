//! Identity seam for the chat.
//!
//! The chat only needs to know who is typing. Sign-in itself happens
//! elsewhere; an absent identity means the composer stays disabled.

/// Source of the current user's identity.
pub trait IdentityProvider: Send + Sync {
    /// Returns the current user's opaque identity (e.g. an email address),
    /// or `None` when nobody is signed in.
    fn current_user(&self) -> Option<String>;
}

/// Identity fixed at construction time.
///
/// # Example
///
/// ```
/// use bulletin_core::identity::{IdentityProvider, StaticIdentity};
///
/// let identity = StaticIdentity::signed_in("alice@example.edu");
/// assert_eq!(identity.current_user().as_deref(), Some("alice@example.edu"));
/// assert!(StaticIdentity::anonymous().current_user().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<String>,
}

impl StaticIdentity {
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}
