//! HTTP Server Configuration
//!
//! Bind address, public URLs, CORS and upload limits.

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the document token in `sign_url_template`
pub const TOKEN_PLACEHOLDER: &str = "{token}";

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Absolute base URL that stored files are served under
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// URL of the signing page, `{token}` is replaced per document
    #[serde(default = "default_sign_url_template")]
    pub sign_url_template: String,

    /// CORS allowed origins. Empty means any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size for uploads, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_public_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_sign_url_template() -> String {
    "http://localhost:3000/sign/{token}".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            sign_url_template: default_sign_url_template(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the values that cannot be caught by deserialization
    pub fn validate(&self) -> Result<(), String> {
        if self.public_url.trim().is_empty() {
            return Err("public_url must not be empty".to_string());
        }
        if !self.sign_url_template.contains(TOKEN_PLACEHOLDER) {
            return Err(format!(
                "sign_url_template must contain '{}'",
                TOKEN_PLACEHOLDER
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HttpServerConfig =
            serde_json::from_str(r#"{"port": 9000, "public_url": "https://docs.example.com"}"#)
                .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_url, "https://docs.example.com");
        assert_eq!(config.sign_url_template, default_sign_url_template());
    }

    #[test]
    fn test_validate_requires_token_placeholder() {
        let config = HttpServerConfig {
            sign_url_template: "http://localhost:3000/sign".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("{token}"));
    }
}
