//! Error types for the Kiln provider client

use kiln_core::GenerationError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the image provider
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a status code was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider returned a non-success status code
    #[error("Provider rejected request (status {status}): {body}")]
    ProviderRejected {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Success status, but the body matched no known field path
    #[error("Unrecognised response body: {body}")]
    SchemaMismatch {
        /// Raw response body, kept for diagnosing new provider schemas
        body: String,
    },

    /// Asset URL resolved but the download failed
    #[error("Asset {url} unavailable: {reason}")]
    AssetUnavailable { url: String, reason: String },

    /// Request rejected locally, no network call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Create a rejection error from status code and body
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::ProviderRejected {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ProviderRejected { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ProviderRejected { status, .. } if *status >= 500)
    }
}

impl From<ClientError> for GenerationError {
    fn from(err: ClientError) -> Self {
        match err {
            // Transport failures on the provider endpoints are rejections with no status.
            ClientError::RequestFailed(e) => GenerationError::ProviderRejected {
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            },
            ClientError::ProviderRejected { status, body } => GenerationError::ProviderRejected {
                status: Some(status),
                body,
            },
            ClientError::SchemaMismatch { body } => GenerationError::SchemaMismatch { body },
            ClientError::AssetUnavailable { url, reason } => {
                GenerationError::AssetUnavailable { url, reason }
            }
            ClientError::InvalidInput(msg) => GenerationError::InvalidInput(msg),
            ClientError::InvalidConfig(msg) => GenerationError::Misconfigured(msg),
        }
    }
}
