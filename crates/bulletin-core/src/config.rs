use crate::chat::DEFAULT_THREAD_PREFIX;
use serde::{Deserialize, Serialize};

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BulletinConfig {
    #[serde(default)]
    pub user: UserSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            user: UserSettings::default(),
            chat: ChatSettings::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSettings {
    /// Signed-in identity; unset means read-only.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    /// Prefix prepended to a category label to form the thread id.
    #[serde(default = "default_thread_prefix")]
    pub thread_prefix: String,
    /// How many times a write is re-applied after a revision conflict.
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            thread_prefix: default_thread_prefix(),
            max_write_retries: default_max_write_retries(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_thread_prefix() -> String {
    DEFAULT_THREAD_PREFIX.to_string()
}

fn default_max_write_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: BulletinConfig = toml::from_str("").unwrap();
        assert_eq!(config, BulletinConfig::default());
        assert_eq!(config.chat.thread_prefix, "category-");
        assert_eq!(config.chat.max_write_retries, 3);
        assert!(config.user.email.is_none());
    }

    #[test]
    fn test_partial_document() {
        let config: BulletinConfig = toml::from_str(
            r#"
            log_level = "debug"

            [user]
            email = "alice@example.edu"

            [chat]
            max_write_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.user.email.as_deref(), Some("alice@example.edu"));
        assert_eq!(config.chat.max_write_retries, 5);
        assert_eq!(config.chat.thread_prefix, "category-");
    }
}
