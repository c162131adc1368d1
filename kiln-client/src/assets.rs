//! Asset download

use crate::ProviderClient;
use crate::error::{ClientError, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Raw bytes of a downloaded asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl ProviderClient {
    /// Download a finished asset
    ///
    /// Plain GET without the provider's auth header, since asset URLs are
    /// usually pre-signed CDN links. Every failure, transport or status, is
    /// reported as [`ClientError::AssetUnavailable`].
    pub async fn download_asset(&self, url: &str) -> Result<DownloadedAsset> {
        let unavailable = |reason: String| ClientError::AssetUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        Ok(DownloadedAsset {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderConfig;
    use crate::test_support::serve;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::get;

    #[tokio::test]
    async fn test_download_returns_bytes_and_type() {
        let router = Router::new().route(
            "/i.jpg",
            get(|headers: HeaderMap| async move {
                // Asset links are fetched without the provider key
                if headers.contains_key("x-freepik-api-key") {
                    return (StatusCode::BAD_REQUEST, [(header::CONTENT_TYPE, "text/plain")], vec![]);
                }
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "image/jpeg")],
                    vec![0xFF, 0xD8, 0xFF],
                )
            }),
        );
        let base = serve(router).await;
        let client = ProviderClient::new(ProviderConfig::new(&base, "key")).unwrap();

        let asset = client
            .download_asset(&format!("{}/i.jpg", base))
            .await
            .unwrap();
        assert_eq!(asset.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(asset.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_missing_asset_is_unavailable() {
        let base = serve(Router::new()).await;
        let client = ProviderClient::new(ProviderConfig::new(&base, "key")).unwrap();
        let url = format!("{}/gone.jpg", base);

        match client.download_asset(&url).await.unwrap_err() {
            ClientError::AssetUnavailable { url: failed, reason } => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_asset_is_unavailable() {
        let client =
            ProviderClient::new(ProviderConfig::new("http://127.0.0.1:9", "key")).unwrap();
        let err = client
            .download_asset("http://127.0.0.1:9/i.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AssetUnavailable { .. }));
    }
}
