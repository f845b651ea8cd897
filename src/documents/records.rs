//! # Record Storage
//!
//! Persistence for `Document` records. Two implementations:
//!
//! - [`MemoryRecordStore`]: process-local map, for tests and ephemeral runs
//! - [`JsonRecordStore`]: the same map, snapshotted to a JSON file after
//!   every mutation and reloaded on open
//!
//! Every mutation happens under one write lock, so `update` is an atomic
//! read-check-write for the record it touches.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::model::Document;

/// Which party a listing is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Receiver,
}

/// A scoped listing query. Results are always newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub party: Party,
    pub id: String,
}

impl DocumentQuery {
    pub fn sent_by(sender_id: impl Into<String>) -> Self {
        Self {
            party: Party::Sender,
            id: sender_id.into(),
        }
    }

    pub fn received_by(receiver_id: impl Into<String>) -> Self {
        Self {
            party: Party::Receiver,
            id: receiver_id.into(),
        }
    }

    /// Whether a document falls inside this query's scope
    pub fn matches(&self, document: &Document) -> bool {
        match self.party {
            Party::Sender => document.sender_id == self.id,
            Party::Receiver => document.receiver_id == self.id,
        }
    }
}

/// Closure applied to a record inside `RecordStore::update`
pub type RecordUpdate<'a> = &'a mut dyn FnMut(&mut Document) -> DocumentResult<()>;

/// Trait for document record persistence
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Insert a new record and return it with its sequence number set.
    /// Fails if the token is already present.
    fn insert(&self, document: Document) -> DocumentResult<Document>;

    /// Get a record by token
    fn get(&self, token: &Uuid) -> DocumentResult<Option<Document>>;

    /// Records matching the query, newest first
    fn list(&self, query: &DocumentQuery) -> DocumentResult<Vec<Document>>;

    /// Apply `apply` to the record under the store's write lock and persist
    /// the result. If `apply` fails the record is left untouched.
    fn update(&self, token: &Uuid, apply: RecordUpdate<'_>) -> DocumentResult<Document>;

    /// Check whether a token is taken
    fn contains(&self, token: &Uuid) -> DocumentResult<bool> {
        Ok(self.get(token)?.is_some())
    }
}

fn poisoned() -> DocumentError {
    DocumentError::Internal("Lock poisoned".into())
}

fn select(documents: &HashMap<Uuid, Document>, query: &DocumentQuery) -> Vec<Document> {
    let mut selected: Vec<Document> = documents
        .values()
        .filter(|doc| query.matches(doc))
        .cloned()
        .collect();
    // Newest first; equal timestamps fall back to insertion order
    selected.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.seq.cmp(&a.seq))
            .then_with(|| b.token.cmp(&a.token))
    });
    selected
}

/// Check the token is free and stamp the next sequence number
fn prepare_insert(
    documents: &HashMap<Uuid, Document>,
    mut document: Document,
) -> DocumentResult<Document> {
    if documents.contains_key(&document.token) {
        return Err(DocumentError::Internal(format!(
            "Token already issued: {}",
            document.token
        )));
    }
    document.seq = documents.values().map(|d| d.seq).max().unwrap_or(0) + 1;
    Ok(document)
}

/// Apply an update to a copy of the record and return (old, new)
fn apply_update(
    documents: &mut HashMap<Uuid, Document>,
    token: &Uuid,
    apply: RecordUpdate<'_>,
) -> DocumentResult<(Document, Document)> {
    let current = documents.get_mut(token).ok_or(DocumentError::NotFound)?;
    let previous = current.clone();
    let mut next = current.clone();
    apply(&mut next)?;
    *current = next.clone();
    Ok((previous, next))
}

// ==================
// In-memory store
// ==================

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DocumentResult<RwLockReadGuard<'_, HashMap<Uuid, Document>>> {
        self.documents.read().map_err(|_| poisoned())
    }

    fn write(&self) -> DocumentResult<RwLockWriteGuard<'_, HashMap<Uuid, Document>>> {
        self.documents.write().map_err(|_| poisoned())
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, document: Document) -> DocumentResult<Document> {
        let mut documents = self.write()?;
        let document = prepare_insert(&documents, document)?;
        documents.insert(document.token, document.clone());
        Ok(document)
    }

    fn get(&self, token: &Uuid) -> DocumentResult<Option<Document>> {
        Ok(self.read()?.get(token).cloned())
    }

    fn list(&self, query: &DocumentQuery) -> DocumentResult<Vec<Document>> {
        let documents = self.read()?;
        Ok(select(&documents, query))
    }

    fn update(&self, token: &Uuid, apply: RecordUpdate<'_>) -> DocumentResult<Document> {
        let mut documents = self.write()?;
        let (_, next) = apply_update(&mut documents, token, apply)?;
        Ok(next)
    }
}

// ==================
// JSON file store
// ==================

/// Record store persisted as a JSON array in a single file.
///
/// The file is rewritten in full (temp file, fsync, rename) while the
/// write lock is held, so readers of the file never see a partial
/// snapshot and the in-memory map never runs ahead of disk.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl JsonRecordStore {
    /// Open the store, loading existing records if the file exists
    pub fn open(path: impl Into<PathBuf>) -> DocumentResult<Self> {
        let path = path.into();
        let documents = if path.exists() {
            Self::load(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records held
    pub fn len(&self) -> DocumentResult<usize> {
        Ok(self.documents.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> DocumentResult<bool> {
        Ok(self.len()? == 0)
    }

    fn load(path: &Path) -> DocumentResult<HashMap<Uuid, Document>> {
        let content = fs::read_to_string(path).map_err(|e| {
            DocumentError::Internal(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        let records: Vec<Document> = serde_json::from_str(&content).map_err(|e| {
            DocumentError::Internal(format!("Invalid records file {}: {}", path.display(), e))
        })?;

        let mut documents = HashMap::with_capacity(records.len());
        for record in records {
            if documents.insert(record.token, record).is_some() {
                return Err(DocumentError::Internal(format!(
                    "Duplicate token in {}",
                    path.display()
                )));
            }
        }
        Ok(documents)
    }

    fn persist(&self, documents: &HashMap<Uuid, Document>) -> DocumentResult<()> {
        let mut records: Vec<&Document> = documents.values().collect();
        records.sort_by(|a, b| a.seq.cmp(&b.seq).then(a.token.cmp(&b.token)));

        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| DocumentError::Internal(format!("Failed to encode records: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let write_tmp = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };

        write_tmp().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DocumentError::Internal(format!(
                "Failed to persist {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write(&self) -> DocumentResult<RwLockWriteGuard<'_, HashMap<Uuid, Document>>> {
        self.documents.write().map_err(|_| poisoned())
    }
}

impl RecordStore for JsonRecordStore {
    fn insert(&self, document: Document) -> DocumentResult<Document> {
        let mut documents = self.write()?;
        let document = prepare_insert(&documents, document)?;
        let token = document.token;

        documents.insert(token, document.clone());
        if let Err(e) = self.persist(&documents) {
            documents.remove(&token);
            return Err(e);
        }
        Ok(document)
    }

    fn get(&self, token: &Uuid) -> DocumentResult<Option<Document>> {
        let documents = self.documents.read().map_err(|_| poisoned())?;
        Ok(documents.get(token).cloned())
    }

    fn list(&self, query: &DocumentQuery) -> DocumentResult<Vec<Document>> {
        let documents = self.documents.read().map_err(|_| poisoned())?;
        Ok(select(&documents, query))
    }

    fn update(&self, token: &Uuid, apply: RecordUpdate<'_>) -> DocumentResult<Document> {
        let mut documents = self.write()?;
        let (previous, next) = apply_update(&mut documents, token, apply)?;

        if let Err(e) = self.persist(&documents) {
            documents.insert(*token, previous);
            return Err(e);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::model::DocumentStatus;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn document(sender: &str, receiver: &str, age_secs: i64) -> Document {
        Document::new(
            Uuid::new_v4(),
            sender.into(),
            receiver.into(),
            "contract.pdf".into(),
            b"%PDF",
            Utc::now() - Duration::seconds(age_secs),
        )
    }

    #[test]
    fn test_insert_get() {
        let store = MemoryRecordStore::new();
        let doc = document("a", "b", 0);
        let stored = store.insert(doc.clone()).unwrap();

        assert_eq!(stored.seq, 1);
        assert_eq!(store.get(&doc.token).unwrap(), Some(stored));
        assert!(store.contains(&doc.token).unwrap());
        assert!(!store.contains(&Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let store = MemoryRecordStore::new();
        let doc = document("a", "b", 0);
        store.insert(doc.clone()).unwrap();

        let result = store.insert(doc);
        assert!(matches!(result, Err(DocumentError::Internal(_))));
    }

    #[test]
    fn test_list_scoped_and_newest_first() {
        let store = MemoryRecordStore::new();
        let old = document("alice", "bob", 30);
        let new = document("alice", "carol", 10);
        let other = document("dave", "alice", 0);
        for doc in [&old, &new, &other] {
            store.insert(doc.clone()).unwrap();
        }

        let sent = store.list(&DocumentQuery::sent_by("alice")).unwrap();
        let tokens: Vec<Uuid> = sent.iter().map(|d| d.token).collect();
        assert_eq!(tokens, vec![new.token, old.token]);

        let received = store.list(&DocumentQuery::received_by("alice")).unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].token, other.token);
    }

    #[test]
    fn test_equal_timestamps_list_in_insertion_order() {
        let store = MemoryRecordStore::new();
        let first = document("alice", "bob", 0);
        let mut second = document("alice", "bob", 0);
        second.created_at = first.created_at;
        // Token order must not decide the listing
        let (first, second) = if first.token > second.token {
            (first, second)
        } else {
            (second, first)
        };
        store.insert(first.clone()).unwrap();
        store.insert(second.clone()).unwrap();

        let tokens: Vec<Uuid> = store
            .list(&DocumentQuery::sent_by("alice"))
            .unwrap()
            .iter()
            .map(|d| d.token)
            .collect();
        assert_eq!(tokens, vec![second.token, first.token]);
    }

    #[test]
    fn test_json_store_keeps_sequence_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("documents.json");

        let store = JsonRecordStore::open(&path).unwrap();
        store.insert(document("a", "b", 0)).unwrap();
        drop(store);

        let reopened = JsonRecordStore::open(&path).unwrap();
        let next = reopened.insert(document("a", "b", 0)).unwrap();
        assert_eq!(next.seq, 2);
    }

    #[test]
    fn test_update_failure_leaves_record_untouched() {
        let store = MemoryRecordStore::new();
        let doc = document("a", "b", 0);
        store.insert(doc.clone()).unwrap();

        let result = store.update(&doc.token, &mut |d: &mut Document| {
            d.status = DocumentStatus::Accepted;
            Err(DocumentError::Conflict)
        });

        assert!(matches!(result, Err(DocumentError::Conflict)));
        assert_eq!(store.get(&doc.token).unwrap().unwrap().status, DocumentStatus::Pending);
    }

    #[test]
    fn test_update_unknown_token() {
        let store = MemoryRecordStore::new();
        let result = store.update(&Uuid::new_v4(), &mut |_: &mut Document| Ok(()));
        assert!(matches!(result, Err(DocumentError::NotFound)));
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("documents.json");
        let doc = document("a", "b", 0);

        {
            let store = JsonRecordStore::open(&path).unwrap();
            store.insert(doc.clone()).unwrap();
            store
                .update(&doc.token, &mut |d: &mut Document| {
                    d.decide(DocumentStatus::Rejected, Utc::now())
                })
                .unwrap();
        }

        let reopened = JsonRecordStore::open(&path).unwrap();
        let loaded = reopened.get(&doc.token).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Rejected);
        assert_eq!(loaded.created_at, doc.created_at);
        assert_eq!(reopened.len().unwrap(), 1);
        assert!(!temp.path().join("documents.json.tmp").exists());
    }

    #[test]
    fn test_json_store_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("documents.json");
        fs::write(&path, "").unwrap();

        let store = JsonRecordStore::open(&path).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("documents.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            JsonRecordStore::open(&path),
            Err(DocumentError::Internal(_))
        ));
    }
}
