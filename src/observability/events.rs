//! Observable events
//!
//! Every log line carries one of these event names.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    DataDirInitialized,
    RecordsLoaded,
    Serving,
    ShutdownComplete,

    // Documents
    DocumentCreated,
    DocumentDecided,
    /// Decision on an already decided document
    DecisionConflict,
    /// Upload failed field validation
    UploadRejected,
    /// File or record persistence failed
    StorageFailure,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "DOCSIGN_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DataDirInitialized => "DATA_DIR_INITIALIZED",
            Event::RecordsLoaded => "RECORDS_LOADED",
            Event::Serving => "DOCSIGN_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::DocumentCreated => "DOCUMENT_CREATED",
            Event::DocumentDecided => "DOCUMENT_DECIDED",
            Event::DecisionConflict => "DECISION_CONFLICT",
            Event::UploadRejected => "UPLOAD_REJECTED",
            Event::StorageFailure => "STORAGE_FAILURE",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DecisionConflict | Event::UploadRejected => Severity::Warn,
            Event::StorageFailure => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
