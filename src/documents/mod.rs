//! # Documents
//!
//! The document lifecycle: a PDF is uploaded by a sender for a receiver,
//! starts out `pending`, and is decided exactly once (`accepted` or
//! `rejected`).
//!
//! - [`model`]: the `Document` record and its status transition
//! - [`validation`]: typed request inputs and field-level errors
//! - [`records`]: record persistence (in-memory and JSON file)
//! - [`store`]: the store that ties file payloads to records

pub mod errors;
pub mod model;
pub mod records;
pub mod store;
pub mod validation;

pub use errors::{DocumentError, DocumentResult};
pub use model::{parse_token, Document, DocumentStatus};
pub use records::{DocumentQuery, JsonRecordStore, MemoryRecordStore, RecordStore};
pub use store::DocumentStore;
pub use validation::{
    validate_decision, validate_upload, DecisionInput, FieldError, UploadInput, UploadedFile,
    ValidUpload, ValidationErrors,
};
