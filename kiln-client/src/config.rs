//! Provider connection settings

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.freepik.com/v1/ai";
pub const DEFAULT_API_KEY_HEADER: &str = "x-freepik-api-key";
pub const DEFAULT_SUBMIT_PATH: &str = "/generate";
pub const DEFAULT_STATUS_PATH: &str = "/status";
pub const DEFAULT_RESOURCES_PATH: &str = "/resources";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the client needs to reach one provider
///
/// Read-only once the client is built; the API key is never mutated at runtime.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider API (e.g., "https://api.freepik.com/v1/ai")
    pub base_url: String,
    pub api_key: String,
    /// Header carrying the key; `Authorization` sends it as a bearer token
    pub api_key_header: String,
    pub submit_path: String,
    pub status_path: String,
    pub resources_path: String,
    /// Per-request timeout applied to every HTTP call
    pub request_timeout: Duration,
}

impl ProviderConfig {
    /// Creates a configuration with default paths and header for `base_url`
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            resources_path: DEFAULT_RESOURCES_PATH.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "api_key cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if reqwest::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::InvalidConfig(format!(
                "base_url is not a valid URL: {}",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        self.auth_header()?;
        Ok(())
    }

    /// Builds the authentication header pair
    pub(crate) fn auth_header(&self) -> Result<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_bytes(self.api_key_header.trim().as_bytes())
            .map_err(|e| ClientError::InvalidConfig(format!("invalid api_key_header: {}", e)))?;

        let raw = if name == AUTHORIZATION {
            format!("Bearer {}", self.api_key.trim())
        } else {
            self.api_key.trim().to_string()
        };

        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| ClientError::InvalidConfig("api_key is not a valid header value".to_string()))?;
        value.set_sensitive(true);

        Ok((name, value))
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_key_header", &self.api_key_header)
            .field("submit_path", &self.submit_path)
            .field("status_path", &self.status_path)
            .field("resources_path", &self.resources_path)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
