//! Configuration-based identity provider.
//!
//! Reads the signed-in user from the `[user]` section of `config.toml`,
//! optionally overridden from the command line.

use bulletin_core::config::BulletinConfig;
use bulletin_core::identity::IdentityProvider;

/// Identity taken from configuration.
///
/// A blank email counts as signed out.
#[derive(Debug, Clone, Default)]
pub struct ConfigBasedIdentity {
    email: Option<String>,
}

impl ConfigBasedIdentity {
    /// Builds the identity from `config`, letting `override_user` win.
    pub fn new(config: &BulletinConfig, override_user: Option<String>) -> Self {
        let email = override_user
            .or_else(|| config.user.email.clone())
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        Self { email }
    }
}

impl IdentityProvider for ConfigBasedIdentity {
    fn current_user(&self) -> Option<String> {
        self.email.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let mut config = BulletinConfig::default();
        config.user.email = Some("configured@example.edu".to_string());
        let identity = ConfigBasedIdentity::new(&config, Some("cli@example.edu".to_string()));
        assert_eq!(identity.current_user().as_deref(), Some("cli@example.edu"));
    }

    #[test]
    fn test_falls_back_to_config() {
        let mut config = BulletinConfig::default();
        config.user.email = Some("configured@example.edu".to_string());
        let identity = ConfigBasedIdentity::new(&config, None);
        assert_eq!(identity.current_user().as_deref(), Some("configured@example.edu"));
    }

    #[test]
    fn test_blank_email_is_signed_out() {
        let mut config = BulletinConfig::default();
        config.user.email = Some("   ".to_string());
        assert!(ConfigBasedIdentity::new(&config, None).current_user().is_none());
        assert!(
            ConfigBasedIdentity::new(&BulletinConfig::default(), None)
                .current_user()
                .is_none()
        );
    }
}
