//! # Local Filesystem Backend

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use super::backend::StorageBackend;
use super::errors::{StorageError, StorageResult};

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local backend
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root. Only plain relative components are
    /// accepted so a key can never escape the root directory.
    fn full_path(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(key: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::ObjectNotFound(key.to_string()),
        ErrorKind::AlreadyExists => StorageError::ObjectAlreadyExists(key.to_string()),
        _ => StorageError::IoError(e.to_string()),
    }
}

impl StorageBackend for LocalBackend {
    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::IoError(e.to_string()))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .map_err(|e| map_io(key, e))?;

        let written = file.write_all(data).and_then(|_| file.sync_all());
        if let Err(e) = written {
            // Never leave a truncated object behind
            let _ = fs::remove_file(&full_path);
            return Err(StorageError::IoError(e.to_string()));
        }

        Ok(())
    }

    fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(key)?;
        fs::read(&full_path).map_err(|e| map_io(key, e))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let full_path = self.full_path(key)?;
        fs::remove_file(&full_path).map_err(|e| map_io(key, e))
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.full_path(key)?.exists())
    }
}
