//! docsign - PDF document exchange between two parties
//!
//! A sender uploads a PDF addressed to a receiver; the receiver accepts or
//! rejects it exactly once.
//!
//! - [`documents`]: lifecycle model, validation and the document store
//! - [`file_storage`]: write-once payload storage
//! - [`http_server`]: the HTTP API
//! - [`observability`]: structured logging
//! - [`cli`]: configuration and process entry

pub mod cli;
pub mod documents;
pub mod file_storage;
pub mod http_server;
pub mod observability;
