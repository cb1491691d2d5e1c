//! Atomic TOML document with locked read-modify-write.
//!
//! Backs the thread file and the configuration file.

use bulletin_core::BulletinError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic TOML operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Lock error: {0}")]
    Lock(String),
    /// Raised by an `update` closure to abort without writing.
    #[error(transparent)]
    Rejected(BulletinError),
}

impl From<StorageError> for BulletinError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => e.into(),
            StorageError::Parse(e) => e.into(),
            StorageError::Serialize(e) => e.into(),
            StorageError::Lock(message) => BulletinError::data_access(message),
            StorageError::Rejected(inner) => inner,
        }
    }
}

/// A TOML file written via temp file + fsync + rename.
///
/// `update` additionally holds an exclusive `fs2` lock on a sibling `.lock`
/// file for the whole load-modify-save cycle, so two processes sharing the
/// file cannot interleave their writes.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document.
    ///
    /// A missing or blank file yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<T>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Writes the document atomically.
    pub fn save(&self, data: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Locked read-modify-write.
    ///
    /// `f` receives the current document (or `default_value` when the file
    /// does not exist yet). If it returns `Err`, nothing is written.
    pub fn update<R, F>(&self, default_value: T, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut T) -> Result<R, StorageError>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data)?;
        self.save(&data)?;

        Ok(result)
    }

    fn temp_path(&self) -> Result<PathBuf, StorageError> {
        let invalid = |what: &str| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Path has no {}", what),
            ))
        };
        let parent = self.path.parent().ok_or_else(|| invalid("parent directory"))?;
        let file_name = self.path.file_name().ok_or_else(|| invalid("file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock guard; released when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Counter>::new(temp_dir.path().join("missing.toml"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counter.toml");
        let file = AtomicTomlFile::<Counter>::new(path.clone());

        file.save(&Counter { count: 7 }).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".counter.toml.tmp").exists());
        assert_eq!(file.load().unwrap(), Some(Counter { count: 7 }));
    }

    #[test]
    fn test_update_returns_closure_value() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Counter>::new(temp_dir.path().join("counter.toml"));

        let first = file
            .update(Counter::default(), |c| {
                c.count += 10;
                Ok(c.count)
            })
            .unwrap();
        let second = file
            .update(Counter::default(), |c| {
                c.count += 5;
                Ok(c.count)
            })
            .unwrap();

        assert_eq!(first, 10);
        assert_eq!(second, 15);
    }

    #[test]
    fn test_rejected_update_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Counter>::new(temp_dir.path().join("counter.toml"));
        file.save(&Counter { count: 1 }).unwrap();

        let result: Result<(), _> = file.update(Counter::default(), |c| {
            c.count = 99;
            Err(StorageError::Rejected(BulletinError::internal("no")))
        });

        assert!(result.is_err());
        assert_eq!(file.load().unwrap(), Some(Counter { count: 1 }));
    }
}
