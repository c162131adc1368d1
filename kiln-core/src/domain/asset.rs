//! Generated asset domain type

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Bytes of a finished job, together with where they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub job_id: String,
    /// When the provider accepted the job
    pub submitted_at: DateTime<Utc>,
    /// The exact URL the bytes were downloaded from
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Number of status checks performed before the job completed
    pub polls: u32,
    pub elapsed: Duration,
}

impl GeneratedAsset {
    /// File extension suggested by the content type, then by the URL path
    pub fn file_extension(&self) -> &str {
        let from_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .and_then(|mime| match mime {
                "image/jpeg" | "image/jpg" => Some("jpg"),
                "image/png" => Some("png"),
                "image/webp" => Some("webp"),
                "image/gif" => Some("gif"),
                _ => None,
            });
        if let Some(ext) = from_type {
            return ext;
        }

        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit_once('.') {
            Some((_, ext))
                if !ext.is_empty()
                    && ext.len() <= 5
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                ext
            }
            _ => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(url: &str, content_type: Option<&str>) -> GeneratedAsset {
        GeneratedAsset {
            job_id: "J1".to_string(),
            submitted_at: Utc::now(),
            url: url.to_string(),
            bytes: vec![1, 2, 3],
            content_type: content_type.map(str::to_string),
            polls: 1,
            elapsed: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_extension_prefers_content_type() {
        let a = asset("http://x/i.jpg", Some("image/png; charset=binary"));
        assert_eq!(a.file_extension(), "png");
    }

    #[test]
    fn test_extension_falls_back_to_url() {
        assert_eq!(asset("http://x/i.webp?sig=abc", None).file_extension(), "webp");
        assert_eq!(asset("http://x/render", None).file_extension(), "bin");
    }
}
