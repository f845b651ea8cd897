//! # HTTP Server Module
//!
//! The document API over HTTP.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /documents` - Upload a PDF (multipart)
//! - `GET /documents/sent?sender_id=` - Documents sent by a party
//! - `GET /documents/received?receiver_id=` - Documents addressed to a party
//! - `GET /documents/:token/file` - Absolute URL of the stored file
//! - `POST /documents/:token/decision` - Accept or reject, once
//! - `GET /media/pdfs/:file_name` - The stored PDF
//!
//! Every document endpoint is also available under `/api`.

pub mod config;
pub mod document_routes;
pub mod health_routes;
pub mod server;
pub mod urls;

pub use config::HttpServerConfig;
pub use document_routes::{document_routes, DocumentsState};
pub use server::HttpServer;
pub use urls::UrlBuilder;
