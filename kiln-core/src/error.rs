//! Failure taxonomy for one generation invocation

use std::time::Duration;

use thiserror::Error;

use crate::domain::asset::GeneratedAsset;

/// Result of one end-to-end invocation
pub type GenerationOutcome = std::result::Result<GeneratedAsset, GenerationError>;

/// Classified reasons an invocation did not produce an asset
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The client itself is unusable (bad base URL, key or header)
    #[error("Client misconfigured: {0}")]
    Misconfigured(String),

    /// The provider answered with a non-success status, or could not be reached
    /// at all (`status` is `None` then)
    #[error("Provider rejected the request (status {}): {body}", display_status(.status))]
    ProviderRejected { status: Option<u16>, body: String },

    /// Success status, but the body matched none of the known field paths
    #[error("Unrecognised provider response: {body}")]
    SchemaMismatch { body: String },

    /// The asset URL was resolved but the download failed
    #[error("Asset at {url} unavailable: {reason}")]
    AssetUnavailable { url: String, reason: String },

    /// The provider declared the job failed or cancelled
    #[error("Job {job_id} {}", failure_verb(.cancelled_by_provider))]
    JobFailed {
        job_id: String,
        cancelled_by_provider: bool,
    },

    /// The deadline passed, or the caller gave up, while the job was still running
    #[error("Job {} still processing after {elapsed:?}{}", job_label(.job_id), cancel_suffix(.cancelled))]
    TimedOut {
        job_id: Option<String>,
        elapsed: Duration,
        cancelled: bool,
    },
}

/// Fieldless discriminant of [`GenerationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InvalidInput,
    Misconfigured,
    ProviderRejected,
    SchemaMismatch,
    AssetUnavailable,
    JobFailed,
    TimedOut,
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::Misconfigured(_) => FailureKind::Misconfigured,
            Self::ProviderRejected { .. } => FailureKind::ProviderRejected,
            Self::SchemaMismatch { .. } => FailureKind::SchemaMismatch,
            Self::AssetUnavailable { .. } => FailureKind::AssetUnavailable,
            Self::JobFailed { .. } => FailureKind::JobFailed,
            Self::TimedOut { .. } => FailureKind::TimedOut,
        }
    }

    /// Whether the job may still finish upstream and is worth checking later
    ///
    /// Everything except a timeout is final for this invocation.
    pub fn is_retry_later(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Raw provider body kept for diagnostics, if any
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::ProviderRejected { body, .. } | Self::SchemaMismatch { body } => Some(body),
            _ => None,
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

fn failure_verb(cancelled_by_provider: &bool) -> &'static str {
    if *cancelled_by_provider {
        "was cancelled by the provider"
    } else {
        "failed"
    }
}

fn job_label(job_id: &Option<String>) -> &str {
    job_id.as_deref().unwrap_or("<unsubmitted>")
}

fn cancel_suffix(cancelled: &bool) -> &'static str {
    if *cancelled { " (cancelled by caller)" } else { "" }
}
