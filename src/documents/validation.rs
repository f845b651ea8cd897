//! # Request Validation
//!
//! Typed inputs for the upload and decision operations, and the
//! functions that turn them into validated values or a list of field
//! errors.

use std::fmt;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::model::DocumentStatus;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";
pub const NO_FILE: &str = "No file was submitted.";
pub const ONLY_PDF: &str = "Only PDF files are allowed.";

/// A single field-level error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of field errors. Serializes as `{field: message}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message for a field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for error in &self.errors {
            map.serialize_entry(&error.field, &error.message)?;
        }
        map.end()
    }
}

/// Uploaded file part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Raw upload request, as collected from the multipart body
#[derive(Debug, Clone, Default)]
pub struct UploadInput {
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub file: Option<UploadedFile>,
}

/// Upload request that passed validation
#[derive(Debug, Clone)]
pub struct ValidUpload {
    pub sender_id: String,
    pub receiver_id: String,
    pub file: UploadedFile,
}

/// Raw decision request body. `status` is kept as a raw JSON value so a
/// wrong type is reported as a field error; `None` means the key was absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionInput {
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Value>,
}

impl DecisionInput {
    pub fn with_status(status: impl Into<Value>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }
}

/// Keep an explicit `null` distinct from a missing key
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Case-insensitive `.pdf` extension check
pub fn is_pdf_file_name(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> String {
    match value {
        None => {
            errors.add(field, REQUIRED);
            String::new()
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, BLANK);
            String::new()
        }
        Some(v) => v.trim().to_string(),
    }
}

/// Validate an upload request. All field errors are collected.
pub fn validate_upload(input: UploadInput) -> Result<ValidUpload, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let sender_id = required_text(&mut errors, "sender_id", input.sender_id);
    let receiver_id = required_text(&mut errors, "receiver_id", input.receiver_id);

    let file = match input.file {
        None => {
            errors.add("file", NO_FILE);
            None
        }
        Some(file) if !is_pdf_file_name(&file.file_name) => {
            errors.add("file", ONLY_PDF);
            None
        }
        Some(file) => Some(file),
    };

    match file {
        Some(file) => errors.into_result(ValidUpload {
            sender_id,
            receiver_id,
            file,
        }),
        None => Err(errors),
    }
}

/// Validate a decision request
pub fn validate_decision(input: &DecisionInput) -> Result<DocumentStatus, ValidationErrors> {
    let value = match &input.status {
        None => return Err(ValidationErrors::single("status", REQUIRED)),
        Some(Value::Null) => return Err(ValidationErrors::single("status", NULL)),
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
    };

    DocumentStatus::parse_decision(&value).ok_or_else(|| {
        ValidationErrors::single("status", format!("\"{}\" is not a valid choice.", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> Option<UploadedFile> {
        Some(UploadedFile {
            file_name: name.to_string(),
            data: b"%PDF-1.4".to_vec(),
        })
    }

    fn input(file: Option<UploadedFile>) -> UploadInput {
        UploadInput {
            sender_id: Some("123456789012".into()),
            receiver_id: Some("210987654321".into()),
            file,
        }
    }

    #[test]
    fn test_pdf_extension_is_case_insensitive() {
        assert!(is_pdf_file_name("contract.pdf"));
        assert!(is_pdf_file_name("CONTRACT.PDF"));
        assert!(is_pdf_file_name("archive.tar.Pdf"));
        assert!(!is_pdf_file_name("contract.docx"));
        assert!(!is_pdf_file_name("contract.pdf.exe"));
        assert!(!is_pdf_file_name("pdf"));
        assert!(!is_pdf_file_name(".pdf"));
        assert!(!is_pdf_file_name(""));
    }

    #[test]
    fn test_valid_upload() {
        let valid = validate_upload(input(pdf("contract.pdf"))).unwrap();
        assert_eq!(valid.sender_id, "123456789012");
        assert_eq!(valid.file.file_name, "contract.pdf");
    }

    #[test]
    fn test_non_pdf_rejected() {
        let errors = validate_upload(input(pdf("contract.txt"))).unwrap_err();
        assert_eq!(errors.get("file"), Some(ONLY_PDF));
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn test_missing_fields_collected() {
        let errors = validate_upload(UploadInput {
            sender_id: None,
            receiver_id: Some("   ".into()),
            file: None,
        })
        .unwrap_err();

        assert_eq!(errors.get("sender_id"), Some(REQUIRED));
        assert_eq!(errors.get("receiver_id"), Some(BLANK));
        assert_eq!(errors.get("file"), Some(NO_FILE));
    }

    #[test]
    fn test_errors_serialize_as_object() {
        let errors = ValidationErrors::single("file", ONLY_PDF);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"file": "Only PDF files are allowed."}));
    }

    #[test]
    fn test_validate_decision() {
        let accepted = DecisionInput::with_status("accepted");
        assert_eq!(validate_decision(&accepted).unwrap(), DocumentStatus::Accepted);

        let missing = DecisionInput { status: None };
        assert_eq!(validate_decision(&missing).unwrap_err().get("status"), Some(REQUIRED));

        let pending = DecisionInput::with_status("pending");
        assert_eq!(
            validate_decision(&pending).unwrap_err().get("status"),
            Some("\"pending\" is not a valid choice.")
        );
    }

    #[test]
    fn test_decision_status_of_wrong_type() {
        let input: DecisionInput = serde_json::from_str(r#"{"status": 5}"#).unwrap();
        assert_eq!(
            validate_decision(&input).unwrap_err().get("status"),
            Some("\"5\" is not a valid choice.")
        );

        let input: DecisionInput = serde_json::from_str(r#"{"status": true}"#).unwrap();
        assert_eq!(
            validate_decision(&input).unwrap_err().get("status"),
            Some("\"true\" is not a valid choice.")
        );
    }

    #[test]
    fn test_decision_status_null_and_missing() {
        let input: DecisionInput = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(validate_decision(&input).unwrap_err().get("status"), Some(NULL));

        let input: DecisionInput = serde_json::from_str("{}").unwrap();
        assert_eq!(validate_decision(&input).unwrap_err().get("status"), Some(REQUIRED));
    }
}
