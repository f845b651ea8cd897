//! # Document Model

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};

/// Directory (key prefix) that uploaded PDFs are stored under
pub const PDF_PREFIX: &str = "pdfs";

/// Lifecycle status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Awaiting the receiver's decision
    Pending,
    /// Accepted by the receiver (terminal)
    Accepted,
    /// Rejected by the receiver (terminal)
    Rejected,
}

impl DocumentStatus {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Rejected => "rejected",
        }
    }

    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DocumentStatus::Pending)
    }

    /// Parse a decision value. Only terminal statuses are valid decisions.
    pub fn parse_decision(value: &str) -> Option<Self> {
        match value {
            "accepted" => Some(DocumentStatus::Accepted),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document exchanged between a sender and a receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub token: Uuid,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: DocumentStatus,
    /// Storage key of the PDF payload, derived from the token
    pub file_key: String,
    /// File name as uploaded
    pub original_name: String,
    pub size: u64,
    /// SHA-256 of the stored payload (hex)
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion order, assigned by the record store
    #[serde(default)]
    pub seq: u64,
}

impl Document {
    /// Create a new pending document
    pub fn new(
        token: Uuid,
        sender_id: String,
        receiver_id: String,
        original_name: String,
        data: &[u8],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            sender_id,
            receiver_id,
            status: DocumentStatus::Pending,
            file_key: file_key(&token, &original_name),
            original_name,
            size: data.len() as u64,
            checksum: calculate_checksum(data),
            created_at: now,
            updated_at: now,
            seq: 0,
        }
    }

    /// Apply a decision. Allowed once, and only from `pending`.
    pub fn decide(&mut self, status: DocumentStatus, now: DateTime<Utc>) -> DocumentResult<()> {
        if !status.is_terminal() {
            return Err(DocumentError::InvalidArgument(format!(
                "'{}' is not a decision",
                status
            )));
        }
        if self.status.is_terminal() {
            return Err(DocumentError::Conflict);
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// File name part of the storage key
    pub fn file_name(&self) -> &str {
        self.file_key.rsplit('/').next().unwrap_or(&self.file_key)
    }
}

/// Parse an external token string
pub fn parse_token(raw: &str) -> DocumentResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| DocumentError::InvalidArgument("Invalid token".into()))
}

/// Storage key for a document: `pdfs/<token>.<original extension>`
pub fn file_key(token: &Uuid, original_name: &str) -> String {
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}/{}.{}", PDF_PREFIX, token, ext),
        None => format!("{}/{}", PDF_PREFIX, token),
    }
}

/// SHA-256 checksum of a payload (hex)
pub fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Document {
        Document::new(
            Uuid::new_v4(),
            "123456789012".into(),
            "210987654321".into(),
            "contract.pdf".into(),
            b"%PDF-1.4",
            Utc::now(),
        )
    }

    #[test]
    fn test_new_document_is_pending() {
        let doc = pending();
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.size, 8);
        assert_eq!(doc.checksum.len(), 64);
    }

    #[test]
    fn test_file_key_uses_token_and_extension() {
        let doc = pending();
        assert_eq!(doc.file_key, format!("pdfs/{}.pdf", doc.token));
        assert_eq!(doc.file_name(), format!("{}.pdf", doc.token));
    }

    #[test]
    fn test_file_key_keeps_original_extension_case() {
        let token = Uuid::new_v4();
        assert_eq!(file_key(&token, "SCAN.PDF"), format!("pdfs/{}.PDF", token));
    }

    #[test]
    fn test_decide_once() {
        let mut doc = pending();
        let later = doc.created_at + chrono::Duration::seconds(5);

        doc.decide(DocumentStatus::Accepted, later).unwrap();
        assert_eq!(doc.status, DocumentStatus::Accepted);
        assert_eq!(doc.updated_at, later);

        let again = doc.decide(DocumentStatus::Rejected, Utc::now());
        assert!(matches!(again, Err(DocumentError::Conflict)));
        assert_eq!(doc.status, DocumentStatus::Accepted);
        assert_eq!(doc.updated_at, later);
    }

    #[test]
    fn test_decide_rejects_pending_target() {
        let mut doc = pending();
        let result = doc.decide(DocumentStatus::Pending, Utc::now());
        assert!(matches!(result, Err(DocumentError::InvalidArgument(_))));
        assert_eq!(doc.status, DocumentStatus::Pending);
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(DocumentStatus::parse_decision("accepted"), Some(DocumentStatus::Accepted));
        assert_eq!(DocumentStatus::parse_decision("rejected"), Some(DocumentStatus::Rejected));
        assert_eq!(DocumentStatus::parse_decision("pending"), None);
        assert_eq!(DocumentStatus::parse_decision("ACCEPTED"), None);
        assert_eq!(DocumentStatus::parse_decision(""), None);
    }

    #[test]
    fn test_parse_token() {
        let token = Uuid::new_v4();
        assert_eq!(parse_token(&token.to_string()).unwrap(), token);
        assert!(matches!(
            parse_token("not-a-uuid"),
            Err(DocumentError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&DocumentStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
    }
}
