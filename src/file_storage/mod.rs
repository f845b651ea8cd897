//! # File Storage
//!
//! Binary payload storage for uploaded documents. Objects are addressed by
//! a relative key (`pdfs/<token>.pdf`) and are write-once.

pub mod backend;
pub mod errors;
pub mod local;

pub use backend::StorageBackend;
pub use errors::{StorageError, StorageResult};
pub use local::LocalBackend;
