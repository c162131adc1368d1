//! Generation request domain type

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

pub const DEFAULT_RESOLUTION: &str = "1k";
pub const DEFAULT_ASPECT_RATIO: &str = "square_1_1";
pub const DEFAULT_MODEL: &str = "realism";

/// One image-generation request
///
/// Built once per invocation and never mutated afterwards. The serialized
/// form is the JSON body sent to the provider's submit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub model: String,
}

impl GenerationRequest {
    /// Creates a request for `prompt` with the default resolution, aspect ratio and model
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
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

    /// Checks the request can be sent to the provider
    ///
    /// The prompt must contain something other than whitespace.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
