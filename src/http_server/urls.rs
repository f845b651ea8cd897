//! Absolute URLs handed out to clients

use super::config::{HttpServerConfig, TOKEN_PLACEHOLDER};
use crate::documents::Document;

/// Route prefix stored files are served under
pub const MEDIA_PREFIX: &str = "/media";

/// Builds file and sign URLs from the configured bases
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    public_url: String,
    sign_url_template: String,
}

impl UrlBuilder {
    pub fn new(public_url: &str, sign_url_template: &str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            sign_url_template: sign_url_template.to_string(),
        }
    }

    pub fn from_config(config: &HttpServerConfig) -> Self {
        Self::new(&config.public_url, &config.sign_url_template)
    }

    /// Absolute URL of a document's stored file
    pub fn file_url(&self, document: &Document) -> String {
        format!("{}{}/{}", self.public_url, MEDIA_PREFIX, document.file_key)
    }

    /// URL of the page where the receiver signs a document
    pub fn sign_url(&self, document: &Document) -> String {
        self.sign_url_template
            .replace(TOKEN_PLACEHOLDER, &document.token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn doc() -> Document {
        Document::new(
            Uuid::new_v4(),
            "a".into(),
            "b".into(),
            "c.pdf".into(),
            b"%PDF",
            Utc::now(),
        )
    }

    #[test]
    fn test_file_url() {
        let urls = UrlBuilder::new("http://localhost:8000/", "http://x/sign/{token}");
        let doc = doc();
        assert_eq!(
            urls.file_url(&doc),
            format!("http://localhost:8000/media/pdfs/{}.pdf", doc.token)
        );
    }

    #[test]
    fn test_sign_url() {
        let urls = UrlBuilder::new("http://localhost:8000", "http://localhost:3000/sign/{token}");
        let doc = doc();
        assert_eq!(
            urls.sign_url(&doc),
            format!("http://localhost:3000/sign/{}", doc.token)
        );
    }
}
