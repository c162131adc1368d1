//! Schema probing
//!
//! The provider has moved fields around between releases, so values are
//! looked up at a fixed list of JSON pointers, first match wins. The lists
//! below are the only place the known response shapes are described.

use serde_json::Value;

/// Where a submit response may carry the job identifier, highest priority first
pub const JOB_ID_PATHS: &[&str] = &[
    "/data/task_id",
    "/data/job_id",
    "/task_id",
    "/job_id",
    "/data/id",
    "/id",
];

/// Where a status response may carry the job status string
pub const STATUS_PATHS: &[&str] = &["/data/status", "/status"];

/// Where a completed status response may carry the asset URL
pub const ASSET_URL_PATHS: &[&str] = &[
    "/data/result/image_url",
    "/data/result/images/0/url",
    "/data/generated/0",
    "/result/image_url",
];

/// A value found by a probe, with the path it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed {
    pub path: &'static str,
    pub value: String,
}

/// Returns the first non-empty string at any of `paths`
pub fn probe_str(body: &Value, paths: &[&'static str]) -> Option<Probed> {
    paths.iter().find_map(|path| {
        body.pointer(path)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| Probed {
                path: *path,
                value: s.to_string(),
            })
    })
}

/// Like [`probe_str`], but integer identifiers are accepted and rendered in decimal
pub fn probe_id(body: &Value, paths: &[&'static str]) -> Option<Probed> {
    paths.iter().find_map(|path| {
        let value = match body.pointer(path)? {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            Value::Number(n) if n.is_u64() || n.is_i64() => n.to_string(),
            _ => return None,
        };
        Some(Probed { path: *path, value })
    })
}

pub fn job_id(body: &Value) -> Option<Probed> {
    probe_id(body, JOB_ID_PATHS)
}

pub fn status(body: &Value) -> Option<Probed> {
    probe_str(body, STATUS_PATHS)
}

pub fn asset_url(body: &Value) -> Option<Probed> {
    probe_str(body, ASSET_URL_PATHS)
}
