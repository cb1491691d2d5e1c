//! Loads and saves `config.toml`.

use crate::storage::AtomicTomlFile;
use bulletin_core::BulletinError;
use bulletin_core::config::BulletinConfig;
use bulletin_core::error::Result;
use std::path::PathBuf;

/// File-backed configuration access.
pub struct ConfigService {
    file: AtomicTomlFile<BulletinConfig>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// missing or empty.
    ///
    /// # Errors
    ///
    /// `Config` when `chat.thread_prefix` is blank; thread ids would then be
    /// bare labels sharing the namespace with every other thread.
    pub fn load(&self) -> Result<BulletinConfig> {
        match self.file.load()? {
            Some(config) => {
                tracing::debug!("[ConfigService] Loaded {}", self.file.path().display());
                if config.chat.thread_prefix.trim().is_empty() {
                    return Err(BulletinError::config("chat.thread_prefix must not be empty"));
                }
                Ok(config)
            }
            None => {
                tracing::debug!(
                    "[ConfigService] No config at {}, using defaults",
                    self.file.path().display()
                );
                Ok(BulletinConfig::default())
            }
        }
    }

    pub fn save(&self, config: &BulletinConfig) -> Result<()> {
        self.file.save(config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));
        assert_eq!(service.load().unwrap(), BulletinConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        let mut config = BulletinConfig::default();
        config.user.email = Some("alice@example.edu".to_string());
        config.chat.max_write_retries = 7;
        service.save(&config).unwrap();

        assert_eq!(service.load().unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "log_level = [").unwrap();

        let err = ConfigService::new(path).load().unwrap_err();
        assert!(matches!(err, BulletinError::Serialization { .. }));
    }

    #[test]
    fn test_blank_thread_prefix_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nthread_prefix = \" \"\n").unwrap();

        let err = ConfigService::new(path).load().unwrap_err();
        assert!(matches!(err, BulletinError::Config(_)));
    }
}
