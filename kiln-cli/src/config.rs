//! Configuration module
//!
//! Handles CLI configuration: where the provider lives and how to authenticate.

use std::time::Duration;

use anyhow::{Context, Result};
use kiln_client::{ProviderClient, ProviderConfig};

/// CLI configuration
#[derive(Clone)]
pub struct Config {
    /// Base URL of the provider API
    pub base_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.base_url, &self.api_key)
            .with_api_key_header(&self.api_key_header)
            .with_request_timeout(self.request_timeout)
    }

    /// Builds a provider client, failing early on a missing key or bad URL
    pub fn client(&self) -> Result<ProviderClient> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("No API key given; pass --api-key or set KILN_API_KEY");
        }

        ProviderClient::new(self.provider_config()).context("Failed to create provider client")
    }
}
