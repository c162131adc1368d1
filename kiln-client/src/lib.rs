//! Kiln Provider Client
//!
//! A small HTTP client for an asynchronous image-generation provider.
//!
//! The provider accepts a generation request, hands back a job id, and
//! exposes a status endpoint to poll until the job finishes. This crate wraps
//! those calls and normalises the provider's varying response shapes into
//! [`kiln_core`] types, so callers never look at raw JSON.
//!
//! # Example
//!
//! ```no_run
//! use kiln_client::{ProviderClient, ProviderConfig};
//! use kiln_core::GenerationRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ProviderClient::new(ProviderConfig::new(
//!         "https://api.freepik.com/v1/ai",
//!         "my-api-key",
//!     ))?;
//!
//!     let handle = client
//!         .submit(&GenerationRequest::new("a red fox in the snow"))
//!         .await?;
//!     let status = client.fetch_status(&handle).await?;
//!
//!     println!("Job {} is {}", handle, status.label());
//!     Ok(())
//! }
//! ```

mod assets;
pub mod config;
pub mod error;
mod jobs;
mod resources;

// Re-export commonly used types
pub use assets::DownloadedAsset;
pub use config::ProviderConfig;
pub use error::{ClientError, Result};
pub use resources::ResourceSummary;

use async_trait::async_trait;
use kiln_core::{GenerationRequest, JobHandle, JobStatus};
use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};

/// The three provider operations a generation invocation needs
///
/// [`ProviderClient`] is the HTTP implementation; the poller only depends on
/// this trait.
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Submits a generation request and returns the provider's job handle
    async fn submit(&self, req: &GenerationRequest) -> Result<JobHandle>;

    /// Performs one status check for a submitted job
    async fn fetch_status(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Downloads the finished asset
    async fn download_asset(&self, url: &str) -> Result<DownloadedAsset>;
}

/// HTTP client for the image-generation provider
#[derive(Debug, Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    auth: (HeaderName, HeaderValue),
    /// HTTP client instance
    client: Client,
}

impl ProviderClient {
    /// Create a new provider client
    ///
    /// Validates `config` and builds an HTTP client with its request timeout.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(config, client)
    }

    /// Create a new provider client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The config's
    /// request timeout is not applied to `client`.
    pub fn with_client(mut config: ProviderConfig, client: Client) -> Result<Self> {
        config.validate()?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let auth = config.auth_header()?;

        Ok(Self {
            config,
            auth,
            client,
        })
    }

    /// Get the base URL of the provider
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Reads a successful JSON body, keeping the raw text alongside it
    ///
    /// Non-success statuses become [`ClientError::ProviderRejected`] with the raw
    /// body; a body that is not JSON becomes [`ClientError::SchemaMismatch`].
    async fn handle_json(&self, response: reqwest::Response) -> Result<(serde_json::Value, String)> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::rejected(status.as_u16(), body));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok((value, body)),
            Err(_) => Err(ClientError::SchemaMismatch { body }),
        }
    }
}

#[async_trait]
impl ProviderApi for ProviderClient {
    async fn submit(&self, req: &GenerationRequest) -> Result<JobHandle> {
        ProviderClient::submit(self, req).await
    }

    async fn fetch_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        ProviderClient::fetch_status(self, handle).await
    }

    async fn download_asset(&self, url: &str) -> Result<DownloadedAsset> {
        ProviderClient::download_asset(self, url).await
    }
}
