//! Document HTTP Routes
//!
//! Upload, listing, file location and decision endpoints. Handlers only
//! collect typed input, validate it and shape the store's answer; all
//! lifecycle rules live in [`DocumentStore`].

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::urls::UrlBuilder;
use crate::documents::{
    parse_token, validate_decision, validate_upload, DecisionInput, Document, DocumentError,
    DocumentResult, DocumentStatus, DocumentStore, UploadInput, UploadedFile,
};
use crate::file_storage::LocalBackend;
use crate::observability::{log_event_with_fields, Event};

// ==================
// Shared State
// ==================

/// Document state shared across handlers
#[derive(Debug)]
pub struct DocumentsState {
    pub store: DocumentStore<LocalBackend>,
    pub urls: UrlBuilder,
}

impl DocumentsState {
    pub fn new(store: DocumentStore<LocalBackend>, urls: UrlBuilder) -> Self {
        Self { store, urls }
    }
}

// ==================
// Request/Response Types
// ==================

/// Full representation returned after an upload
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub token: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: DocumentStatus,
    pub file: String,
    pub sign_url: String,
    pub created_at: String,
}

impl DocumentResponse {
    fn new(document: &Document, urls: &UrlBuilder) -> Self {
        Self {
            token: document.token.to_string(),
            sender_id: document.sender_id.clone(),
            receiver_id: document.receiver_id.clone(),
            status: document.status,
            file: urls.file_url(document),
            sign_url: urls.sign_url(document),
            created_at: document.created_at.to_rfc3339(),
        }
    }
}

/// List entry for sent/received documents
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub token: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: DocumentStatus,
    pub file_url: String,
    pub created_at: String,
}

impl DocumentSummary {
    fn new(document: &Document, urls: &UrlBuilder) -> Self {
        Self {
            token: document.token.to_string(),
            sender_id: document.sender_id.clone(),
            receiver_id: document.receiver_id.clone(),
            status: document.status,
            file_url: urls.file_url(document),
            created_at: document.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SentQuery {
    #[serde(default, alias = "sender_iin")]
    pub sender_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceivedQuery {
    #[serde(default, alias = "receiver_iin")]
    pub receiver_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileLocationResponse {
    pub file_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub status: DocumentStatus,
}

// ==================
// Document Routes
// ==================

/// Create document routes. Each API path also answers with a trailing
/// slash, the form older clients use (`/documents/sent/`).
pub fn document_routes(state: Arc<DocumentsState>) -> Router {
    let api: [(&str, MethodRouter<Arc<DocumentsState>>); 6] = [
        ("/documents", post(upload_handler)),
        // Upload path used by the CRM integration
        ("/bitrix/documents", post(upload_handler)),
        ("/documents/sent", get(list_sent_handler)),
        ("/documents/received", get(list_received_handler)),
        ("/documents/:token/file", get(file_location_handler)),
        ("/documents/:token/decision", post(decision_handler)),
    ];

    let mut router = Router::new();
    for (path, handler) in api {
        router = router
            .route(path, handler.clone())
            .route(&format!("{}/", path), handler);
    }

    router
        .route("/media/pdfs/:file_name", get(media_handler))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Run a store operation on the blocking pool. Record writes fsync the
/// records file, so they must stay off the async workers.
async fn blocking<T, F>(state: &Arc<DocumentsState>, op: F) -> DocumentResult<T>
where
    T: Send + 'static,
    F: FnOnce(&DocumentsState) -> DocumentResult<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state))
        .await
        .map_err(|e| DocumentError::Internal(format!("Store task failed: {}", e)))?
}

fn multipart_error(e: MultipartError) -> DocumentError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DocumentError::PayloadTooLarge(e.body_text())
    } else {
        DocumentError::InvalidRequest(e.body_text())
    }
}

/// Collect the upload fields from a multipart body. Unknown fields are
/// ignored; later duplicates win.
async fn read_upload(mut multipart: Multipart) -> DocumentResult<UploadInput> {
    let mut input = UploadInput::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "sender_id" | "sender_iin" => {
                input.sender_id = Some(field.text().await.map_err(multipart_error)?);
            }
            "receiver_id" | "receiver_iin" => {
                input.receiver_id = Some(field.text().await.map_err(multipart_error)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                input.file = Some(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(input)
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(state): State<Arc<DocumentsState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<DocumentResponse>), DocumentError> {
    let multipart = multipart.map_err(|e| DocumentError::InvalidRequest(e.body_text()))?;
    let input = read_upload(multipart).await?;

    let upload = validate_upload(input).map_err(|errors| {
        log_event_with_fields(Event::UploadRejected, &[("errors", &errors.to_string())]);
        DocumentError::Validation(errors)
    })?;

    let document = blocking(&state, move |state| {
        state.store.create(
            &upload.sender_id,
            &upload.receiver_id,
            &upload.file.data,
            &upload.file.file_name,
        )
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::new(&document, &state.urls)),
    ))
}

async fn list_sent_handler(
    State(state): State<Arc<DocumentsState>>,
    Query(query): Query<SentQuery>,
) -> Result<Json<Vec<DocumentSummary>>, DocumentError> {
    let documents = blocking(&state, move |state| {
        state.store.list_by_sender(query.sender_id.as_deref())
    })
    .await?;
    Ok(Json(
        documents
            .iter()
            .map(|d| DocumentSummary::new(d, &state.urls))
            .collect(),
    ))
}

async fn list_received_handler(
    State(state): State<Arc<DocumentsState>>,
    Query(query): Query<ReceivedQuery>,
) -> Result<Json<Vec<DocumentSummary>>, DocumentError> {
    let documents = blocking(&state, move |state| {
        state.store.list_by_receiver(query.receiver_id.as_deref())
    })
    .await?;
    Ok(Json(
        documents
            .iter()
            .map(|d| DocumentSummary::new(d, &state.urls))
            .collect(),
    ))
}

async fn file_location_handler(
    State(state): State<Arc<DocumentsState>>,
    Path(token): Path<String>,
) -> Result<Json<FileLocationResponse>, DocumentError> {
    let document = blocking(&state, move |state| state.store.get(&token)).await?;
    Ok(Json(FileLocationResponse {
        file_url: state.urls.file_url(&document),
    }))
}

async fn decision_handler(
    State(state): State<Arc<DocumentsState>>,
    Path(token): Path<String>,
    body: Result<Json<DecisionInput>, JsonRejection>,
) -> Result<Json<DecisionResponse>, DocumentError> {
    // Token syntax first, then the requested status; the store is only
    // reached with a valid decision.
    parse_token(&token)?;
    let Json(input) = body.map_err(|e| DocumentError::field("non_field_errors", e.body_text()))?;
    let requested = validate_decision(&input)?;

    let status = blocking(&state, move |state| state.store.decide(&token, requested)).await?;
    Ok(Json(DecisionResponse { status }))
}

async fn media_handler(
    State(state): State<Arc<DocumentsState>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, DocumentError> {
    let token = file_name
        .split_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&file_name)
        .to_string();

    let read = blocking(&state, move |state| state.store.read_file(&token)).await;
    let (document, data) = match read {
        Ok(found) => found,
        Err(DocumentError::InvalidArgument(_)) => return Err(DocumentError::NotFound),
        Err(e) => return Err(e),
    };
    if document.file_name() != file_name {
        return Err(DocumentError::NotFound);
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", document.file_name()),
            ),
        ],
        data,
    ))
}
