//! Stock resource search

use crate::ProviderClient;
use crate::error::{ClientError, Result};
use kiln_core::probe;
use serde_json::Value;

const PREVIEW_PATHS: &[&str] = &["/image/source/url", "/image"];

/// One entry of a resource search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSummary {
    pub title: String,
    pub url: String,
    pub preview: Option<String>,
}

impl ProviderClient {
    /// Search the provider's stock resources
    ///
    /// # Arguments
    /// * `term` - Search keywords
    /// * `limit` - Maximum number of results to request
    pub async fn search_resources(&self, term: &str, limit: u32) -> Result<Vec<ResourceSummary>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ClientError::InvalidInput(
                "search term must not be empty".to_string(),
            ));
        }

        let url = self.endpoint(&self.config.resources_path);
        let response = self
            .client
            .get(&url)
            .header(self.auth.0.clone(), self.auth.1.clone())
            .query(&[
                ("term", term.to_string()),
                ("page", "1".to_string()),
                ("limit", limit.max(1).to_string()),
            ])
            .send()
            .await?;

        let (body, raw) = self.handle_json(response).await?;
        let Some(items) = body.get("data").and_then(Value::as_array) else {
            return Err(ClientError::SchemaMismatch { body: raw });
        };

        Ok(items.iter().filter_map(summarize).collect())
    }
}

fn summarize(item: &Value) -> Option<ResourceSummary> {
    let url = probe::probe_str(item, &["/url"])?.value;
    let title = probe::probe_str(item, &["/title"])
        .map(|p| p.value)
        .unwrap_or_else(|| "(untitled)".to_string());
    let preview = probe::probe_str(item, PREVIEW_PATHS).map(|p| p.value);

    Some(ResourceSummary {
        title,
        url,
        preview,
    })
}
