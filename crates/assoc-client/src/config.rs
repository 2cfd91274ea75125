//! Backend client configuration.

use std::path::PathBuf;
use std::time::Duration;

use assoc_core::defaults;
use assoc_core::{Error, Result};

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (endpoint paths are appended).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Explicit bearer token; takes precedence over `token_file`.
    pub token: Option<String>,
    /// File holding the persisted bearer token.
    pub token_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECS,
            token: None,
            token_file: default_token_file(),
        }
    }
}

/// `<config dir>/assoc-console/token`, or a relative path when the platform
/// has no config directory.
pub fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(defaults::TOKEN_FILE_RELATIVE)
}

impl ClientConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ASSOC_API_URL` | `http://127.0.0.1:8000/api` | REST API base URL |
    /// | `ASSOC_TOKEN` | (none) | Bearer token, overrides the token file |
    /// | `ASSOC_TOKEN_FILE` | `<config dir>/assoc-console/token` | Persisted token |
    /// | `ASSOC_REQUEST_TIMEOUT_SECS` | `15` | Per-request timeout |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ASSOC_API_URL").unwrap_or_else(|_| defaults::API_URL.to_string());

        let timeout_seconds = std::env::var("ASSOC_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS)
            .max(1);

        let token = std::env::var("ASSOC_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let token_file = std::env::var("ASSOC_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_file());

        Self {
            base_url,
            timeout_seconds,
            token,
            token_file,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    pub fn with_timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("ASSOC_API_URL cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "API URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert!(config.token_file.ends_with("assoc-console/token"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ClientConfig::default().with_base_url("ftp://example.org");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ClientConfig::default().with_base_url("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig::default().with_timeout_seconds(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_base_url("https://asso.example.org/api")
            .with_token("abc")
            .with_token_file("/tmp/tok");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.token_file, PathBuf::from("/tmp/tok"));
    }
}
