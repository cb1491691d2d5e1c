//! Path management for bulletin configuration and data files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Platform config directory could not be determined.
    #[error("Cannot find config directory")]
    ConfigDirNotFound,
}

/// Resolves where bulletin keeps its files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/bulletin/          # Config directory (or the override base)
/// ├── config.toml              # Application configuration
/// ├── threads.toml             # Local thread store
/// └── logs/                    # Application logs
///     └── bulletin.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, Default)]
pub struct BulletinPaths {
    base: Option<PathBuf>,
}

impl BulletinPaths {
    /// Creates a resolver. `base` replaces the platform config directory.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the bulletin configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("bulletin"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn threads_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("threads.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
