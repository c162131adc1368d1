//! Job domain types

use chrono::{DateTime, Utc};

/// Provider-assigned identifier of one submitted job
///
/// Returned by a submit call and used as the polling key for the rest of
/// that invocation. Not `Clone`: one handle belongs to exactly one
/// invocation.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    id: String,
    submitted_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            submitted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Status of an upstream job as reported by one status check
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed { asset_url: String },
    Failed,
    Cancelled,
    /// The provider answered, but not in a shape we recognise.
    Unknown(serde_json::Value),
}

impl JobStatus {
    /// Whether polling stops at this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown(_) => "unknown",
        }
    }
}

/// Normalised provider status string, before the asset URL is resolved
///
/// `Completed` needs an asset URL before it can become a [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ProviderState {
    /// Maps a provider status string, ignoring case
    ///
    /// Returns `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        let state = match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "created" | "waiting" => Self::Pending,
            "running" | "in_progress" | "processing" | "started" => Self::Running,
            "completed" | "complete" | "succeeded" | "success" | "done" => Self::Completed,
            "failed" | "failure" | "error" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => return None,
        };
        Some(state)
    }
}
