//! Poller configuration
//!
//! Defines the timing policy of one invocation and the defaults applied to
//! requests built from a bare prompt.

use std::time::Duration;

use kiln_core::GenerationRequest;
use kiln_core::domain::request::{DEFAULT_ASPECT_RATIO, DEFAULT_MODEL, DEFAULT_RESOLUTION};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Poller configuration
///
/// The interval has to be long enough not to trip the provider's rate
/// limiting and short enough to keep latency down.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait between two status checks of the same job
    pub poll_interval: Duration,

    /// Time after submission at which a still-running job is reported as timed out
    pub deadline: Duration,

    pub resolution: String,
    pub aspect_ratio: String,
    pub model: String,
}

impl PollerConfig {
    /// Creates a configuration with the given timing and default request settings
    pub fn new(poll_interval: Duration, deadline: Duration) -> Self {
        Self {
            poll_interval,
            deadline,
            resolution: DEFAULT_RESOLUTION.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builds the request for one invocation from a bare prompt
    pub fn request_for(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(prompt)
            .with_resolution(self.resolution.clone())
            .with_aspect_ratio(self.aspect_ratio.clone())
            .with_model(self.model.clone())
    }

    /// Upper bound on the number of status checks one invocation makes
    pub fn max_polls(&self) -> u32 {
        let ticks = self
            .deadline
            .as_millis()
            .div_ceil(self.poll_interval.as_millis().max(1));
        u32::try_from(ticks).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.deadline.is_zero() {
            anyhow::bail!("deadline must be greater than 0");
        }

        if self.poll_interval > self.deadline {
            anyhow::bail!("poll_interval cannot be longer than deadline");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("model cannot be empty");
        }

        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_DEADLINE)
    }
}
