//! # Storage Backend Trait

use super::errors::StorageResult;

/// Backend trait for file storage
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Write a new object. Must fail with `ObjectAlreadyExists` if the key
    /// is taken, and must not return before the data is durable.
    fn write(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Read an object
    fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    fn exists(&self, key: &str) -> StorageResult<bool>;
}
