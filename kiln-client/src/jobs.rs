//! Job submission and status endpoints

use crate::ProviderClient;
use crate::error::{ClientError, Result};
use kiln_core::domain::job::ProviderState;
use kiln_core::{GenerationError, GenerationRequest, JobHandle, JobStatus, probe};
use tracing::{debug, warn};

impl ProviderClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a generation request
    ///
    /// The prompt is checked locally first; an empty prompt never reaches the
    /// network. Both `200 OK` and `202 Accepted` (any 2xx) count as submitted.
    ///
    /// # Arguments
    /// * `req` - The generation request
    ///
    /// # Returns
    /// The handle of the newly created job
    pub async fn submit(&self, req: &GenerationRequest) -> Result<JobHandle> {
        if let Err(GenerationError::InvalidInput(msg)) = req.validate() {
            return Err(ClientError::InvalidInput(msg));
        }

        let url = self.endpoint(&self.config.submit_path);
        let response = self
            .client
            .post(&url)
            .header(self.auth.0.clone(), self.auth.1.clone())
            .json(req)
            .send()
            .await?;

        let status = response.status();
        let (body, raw) = self.handle_json(response).await?;

        let found = probe::job_id(&body).ok_or(ClientError::SchemaMismatch { body: raw })?;

        debug!(
            "Submitted job {} (status {}, id at {})",
            found.value,
            status.as_u16(),
            found.path
        );

        Ok(JobHandle::new(found.value))
    }

    /// Fetch the current status of a job
    ///
    /// One network round trip. A non-success status is an error, never
    /// "still pending".
    ///
    /// # Arguments
    /// * `handle` - The job handle returned by [`ProviderClient::submit`]
    pub async fn fetch_status(&self, handle: &JobHandle) -> Result<JobStatus> {
        let url = self.status_url(handle)?;
        let response = self
            .client
            .get(url)
            .header(self.auth.0.clone(), self.auth.1.clone())
            .send()
            .await?;

        let (body, raw) = self.handle_json(response).await?;
        parse_status(body, raw)
    }
}

impl ProviderClient {
    /// `{status_path}/{id}`, with the id percent-encoded as a single path segment
    fn status_url(&self, handle: &JobHandle) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoint(&self.config.status_path))
            .map_err(|e| ClientError::InvalidConfig(format!("invalid status URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig("base_url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(handle.id());
        Ok(url)
    }
}

/// Normalises a status response body
fn parse_status(body: serde_json::Value, raw: String) -> Result<JobStatus> {
    let Some(found) = probe::status(&body) else {
        warn!("Status response carries no status field");
        return Ok(JobStatus::Unknown(body));
    };

    let Some(state) = ProviderState::parse(&found.value) else {
        warn!("Unrecognised job status '{}'", found.value);
        return Ok(JobStatus::Unknown(body));
    };

    let status = match state {
        ProviderState::Pending => JobStatus::Pending,
        ProviderState::Running => JobStatus::Running,
        ProviderState::Failed => JobStatus::Failed,
        ProviderState::Cancelled => JobStatus::Cancelled,
        ProviderState::Completed => {
            let asset_url = probe::asset_url(&body)
                .map(|p| p.value)
                .filter(|url| reqwest::Url::parse(url).is_ok())
                .ok_or(ClientError::SchemaMismatch { body: raw })?;
            JobStatus::Completed { asset_url }
        }
    };

    Ok(status)
}
