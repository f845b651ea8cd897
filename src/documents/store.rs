//! # Document Store
//!
//! Owns document records and their PDF payloads. Enforces:
//!
//! - a token is issued once and never reused
//! - payloads are write-once and addressed by token
//! - a status transition happens at most once, only from `pending`

use chrono::Utc;
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::model::{calculate_checksum, parse_token, Document, DocumentStatus};
use super::records::{DocumentQuery, RecordStore};
use super::validation::{is_pdf_file_name, ONLY_PDF};
use crate::file_storage::{StorageBackend, StorageError};
use crate::observability::{log_event_with_fields, Event};

/// Attempts at finding an unused token before giving up
const TOKEN_ATTEMPTS: usize = 3;

/// Document store over a file backend and a record store
#[derive(Debug)]
pub struct DocumentStore<B: StorageBackend> {
    backend: B,
    records: Box<dyn RecordStore>,
}

impl<B: StorageBackend> DocumentStore<B> {
    /// Create a new document store
    pub fn new(backend: B, records: impl RecordStore + 'static) -> Self {
        Self {
            backend,
            records: Box::new(records),
        }
    }

    /// Get the file backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create a pending document and store its payload.
    ///
    /// The payload is durable before the record is written; if the record
    /// cannot be written the payload is removed again.
    pub fn create(
        &self,
        sender_id: &str,
        receiver_id: &str,
        data: &[u8],
        file_name: &str,
    ) -> DocumentResult<Document> {
        if !is_pdf_file_name(file_name) {
            return Err(DocumentError::field("file", ONLY_PDF));
        }

        let document = self.store_payload(sender_id, receiver_id, data, file_name)?;
        let file_key = document.file_key.clone();

        let document = match self.records.insert(document) {
            Ok(stored) => stored,
            Err(e) => {
                self.log_failure(&file_key, &e);
                if let Err(cleanup) = self.backend.delete(&file_key) {
                    // The payload is now orphaned on disk
                    self.log_failure(&file_key, &DocumentError::from(cleanup));
                }
                return Err(e);
            }
        };

        log_event_with_fields(
            Event::DocumentCreated,
            &[
                ("token", &document.token.to_string()),
                ("sender_id", &document.sender_id),
                ("receiver_id", &document.receiver_id),
                ("size", &document.size.to_string()),
            ],
        );

        Ok(document)
    }

    /// Pick a fresh token and write the payload under it. The write itself
    /// refuses existing keys, so a token whose key is taken is skipped.
    fn store_payload(
        &self,
        sender_id: &str,
        receiver_id: &str,
        data: &[u8],
        file_name: &str,
    ) -> DocumentResult<Document> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = Uuid::new_v4();
            if self.records.contains(&token)? {
                continue;
            }

            let document = Document::new(
                token,
                sender_id.to_string(),
                receiver_id.to_string(),
                file_name.to_string(),
                data,
                Utc::now(),
            );

            match self.backend.write(&document.file_key, data) {
                Ok(()) => return Ok(document),
                Err(StorageError::ObjectAlreadyExists(_)) => continue,
                Err(e) => {
                    let err = DocumentError::from(e);
                    self.log_failure(&document.file_key, &err);
                    return Err(err);
                }
            }
        }

        Err(DocumentError::Internal(
            "Could not allocate a unique token".into(),
        ))
    }

    /// Look up a document by its external token
    pub fn get(&self, token: &str) -> DocumentResult<Document> {
        let token = parse_token(token)?;
        self.records.get(&token)?.ok_or(DocumentError::NotFound)
    }

    /// Documents sent by `sender_id`, newest first. A missing or empty id
    /// yields nothing rather than every document.
    pub fn list_by_sender(&self, sender_id: Option<&str>) -> DocumentResult<Vec<Document>> {
        match sender_id.map(str::trim) {
            Some(id) if !id.is_empty() => self.records.list(&DocumentQuery::sent_by(id)),
            _ => Ok(Vec::new()),
        }
    }

    /// Documents addressed to `receiver_id`, newest first. Same empty-id
    /// rule as [`list_by_sender`](Self::list_by_sender).
    pub fn list_by_receiver(&self, receiver_id: Option<&str>) -> DocumentResult<Vec<Document>> {
        match receiver_id.map(str::trim) {
            Some(id) if !id.is_empty() => self.records.list(&DocumentQuery::received_by(id)),
            _ => Ok(Vec::new()),
        }
    }

    /// Decide a pending document. Check and write happen under the record
    /// store's write lock, so of two racing decisions exactly one succeeds
    /// and the other gets `Conflict`.
    pub fn decide(&self, token: &str, status: DocumentStatus) -> DocumentResult<DocumentStatus> {
        let token = parse_token(token)?;
        let result = self.records.update(&token, &mut |document: &mut Document| {
            document.decide(status, Utc::now())
        });

        let token = token.to_string();
        match result {
            Ok(document) => {
                log_event_with_fields(
                    Event::DocumentDecided,
                    &[("token", &token), ("status", document.status.as_str())],
                );
                Ok(document.status)
            }
            Err(DocumentError::Conflict) => {
                log_event_with_fields(
                    Event::DecisionConflict,
                    &[("token", &token), ("requested", status.as_str())],
                );
                Err(DocumentError::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    /// Read a document's payload, verifying it against the recorded checksum
    pub fn read_file(&self, token: &str) -> DocumentResult<(Document, Vec<u8>)> {
        let document = self.get(token)?;
        let data = self.backend.read(&document.file_key)?;

        if calculate_checksum(&data) != document.checksum {
            let err = DocumentError::from(StorageError::ChecksumMismatch(document.file_key.clone()));
            self.log_failure(&document.file_key, &err);
            return Err(err);
        }

        Ok((document, data))
    }

    fn log_failure(&self, file_key: &str, error: &DocumentError) {
        log_event_with_fields(
            Event::StorageFailure,
            &[("file_key", file_key), ("error", &error.to_string())],
        );
    }
}
