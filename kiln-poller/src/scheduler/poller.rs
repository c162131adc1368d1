//! Job poller
//!
//! Drives one generation invocation: submit the request, check the job's
//! status on a fixed interval until it is terminal or the deadline passes,
//! then download the asset. Each invocation can run in its own task; the
//! provider and configuration are the only state shared between them.

use std::future::Future;
use std::sync::Arc;

use kiln_client::ProviderApi;
use kiln_core::{
    GeneratedAsset, GenerationError, GenerationOutcome, GenerationRequest, JobHandle, JobStatus,
};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::PollerConfig;
use crate::scheduler::state::InvocationState;

/// Runs generation invocations against one provider
pub struct JobPoller {
    config: PollerConfig,
    provider: Arc<dyn ProviderApi>,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(config: PollerConfig, provider: Arc<dyn ProviderApi>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Runs one invocation for a bare prompt, using the configured request defaults
    pub async fn run(&self, prompt: &str, cancel: &CancellationToken) -> GenerationOutcome {
        self.run_request(self.config.request_for(prompt), cancel).await
    }

    /// Runs one invocation for a fully specified request
    ///
    /// Returns exactly one outcome. Once `cancel` fires, no further provider
    /// call is made and the invocation ends as [`GenerationError::TimedOut`]
    /// with `cancelled` set.
    pub async fn run_request(
        &self,
        req: GenerationRequest,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let span = info_span!("invocation", id = %Uuid::new_v4());

        async {
            let mut invocation = Invocation::new(self, cancel);
            let outcome = invocation.drive(&req).await;
            invocation.enter(InvocationState::of_outcome(&outcome));

            match &outcome {
                Ok(asset) => info!(
                    "Job {} succeeded after {} poll(s) in {:?} ({} bytes)",
                    asset.job_id,
                    asset.polls,
                    asset.elapsed,
                    asset.bytes.len()
                ),
                Err(e) if e.is_retry_later() => warn!("{}", e),
                Err(e) => error!("{}", e),
            }

            outcome
        }
        .instrument(span)
        .await
    }

    /// Runs one invocation in its own task
    pub fn spawn(
        self: &Arc<Self>,
        prompt: impl Into<String>,
        cancel: CancellationToken,
    ) -> JoinHandle<GenerationOutcome> {
        let poller = Arc::clone(self);
        let prompt = prompt.into();

        tokio::spawn(async move { poller.run(&prompt, &cancel).await })
    }
}

/// Per-invocation state, local to the task running it
struct Invocation<'a> {
    poller: &'a JobPoller,
    cancel: &'a CancellationToken,
    state: InvocationState,
    started: Instant,
    polls: u32,
}

impl<'a> Invocation<'a> {
    fn new(poller: &'a JobPoller, cancel: &'a CancellationToken) -> Self {
        Self {
            poller,
            cancel,
            state: InvocationState::Submitting,
            started: Instant::now(),
            polls: 0,
        }
    }

    fn enter(&mut self, next: InvocationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("Invocation {} -> {}", self.state, next);
        self.state = next;
    }

    async fn drive(&mut self, req: &GenerationRequest) -> GenerationOutcome {
        req.validate()?;

        let poller = self.poller;
        let provider = &poller.provider;
        let handle = match until_cancelled(self.cancel, provider.submit(req)).await {
            Some(submitted) => submitted?,
            None => return Err(self.timed_out(None, true)),
        };
        info!(
            "Submitted job {} at {}",
            handle,
            handle.submitted_at().format("%Y-%m-%d %H:%M:%S")
        );
        self.enter(InvocationState::Polling);

        let interval = poller.config.poll_interval;
        let deadline = Instant::now() + poller.config.deadline;

        loop {
            self.polls += 1;
            let check = provider.fetch_status(&handle);
            let status = match until_deadline(self.cancel, deadline, check).await {
                Ok(status) => status?,
                Err(Interrupted::Cancelled) => return Err(self.timed_out(Some(&handle), true)),
                Err(Interrupted::Deadline) => {
                    warn!("Status check of job {} still in flight at the deadline", handle);
                    return Err(self.timed_out(Some(&handle), false));
                }
            };

            match status {
                JobStatus::Completed { asset_url } => return self.download(&handle, asset_url).await,
                JobStatus::Failed => return Err(job_failed(&handle, false)),
                JobStatus::Cancelled => return Err(job_failed(&handle, true)),
                other => debug!("Job {} is {} (poll {})", handle, other.label(), self.polls),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(Some(&handle), false));
            }

            let pause = interval.min(deadline - now);
            if until_cancelled(self.cancel, time::sleep(pause)).await.is_none() {
                return Err(self.timed_out(Some(&handle), true));
            }
        }
    }

    /// Bounded by the cancel token and the client's request timeout only;
    /// the job has already completed, so the poll deadline no longer applies.
    async fn download(&self, handle: &JobHandle, url: String) -> GenerationOutcome {
        debug!("Downloading asset for job {} from {}", handle, url);

        let provider = &self.poller.provider;
        let asset = match until_cancelled(self.cancel, provider.download_asset(&url)).await {
            Some(asset) => asset?,
            None => return Err(self.timed_out(Some(handle), true)),
        };

        Ok(GeneratedAsset {
            job_id: handle.id().to_string(),
            submitted_at: handle.submitted_at(),
            url,
            bytes: asset.bytes,
            content_type: asset.content_type,
            polls: self.polls,
            elapsed: self.started.elapsed(),
        })
    }

    fn timed_out(&self, handle: Option<&JobHandle>, cancelled: bool) -> GenerationError {
        GenerationError::TimedOut {
            job_id: handle.map(|h| h.id().to_string()),
            elapsed: self.started.elapsed(),
            cancelled,
        }
    }
}

fn job_failed(handle: &JobHandle, cancelled_by_provider: bool) -> GenerationError {
    GenerationError::JobFailed {
        job_id: handle.id().to_string(),
        cancelled_by_provider,
    }
}

/// Awaits `fut` unless `cancel` fires first
async fn until_cancelled<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Why a provider call was abandoned before it returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupted {
    Cancelled,
    Deadline,
}

/// Awaits `fut` unless `cancel` fires or `deadline` passes first
///
/// A call that is ready at the deadline still wins.
async fn until_deadline<T>(
    cancel: &CancellationToken,
    deadline: Instant,
    fut: impl Future<Output = T>,
) -> Result<T, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        out = fut => Ok(out),
        _ = time::sleep_until(deadline) => Err(Interrupted::Deadline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kiln_client::{ClientError, DownloadedAsset};
    use kiln_core::FailureKind;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ASSET_URL: &str = "https://cdn.example.com/J1.jpg";

    /// In-memory provider replaying a fixed script
    ///
    /// Once the status script runs out every further check reports Running.
    struct Scripted {
        submit: Result<String, (u16, String)>,
        statuses: Mutex<VecDeque<Result<JobStatus, ClientError>>>,
        download: Mutex<Option<ClientError>>,
        submits: AtomicUsize,
        polls: AtomicUsize,
        downloads: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn accepting(job_id: &str) -> Self {
            Self {
                submit: Ok(job_id.to_string()),
                statuses: Mutex::new(VecDeque::new()),
                download: Mutex::new(None),
                submits: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
                downloads: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(status: u16, body: &str) -> Self {
            Self {
                submit: Err((status, body.to_string())),
                ..Self::accepting("unused")
            }
        }

        fn then(self, status: JobStatus) -> Self {
            self.statuses.lock().unwrap().push_back(Ok(status));
            self
        }

        fn then_error(self, err: ClientError) -> Self {
            self.statuses.lock().unwrap().push_back(Err(err));
            self
        }

        fn failing_download(self, reason: &str) -> Self {
            *self.download.lock().unwrap() = Some(ClientError::AssetUnavailable {
                url: ASSET_URL.to_string(),
                reason: reason.to_string(),
            });
            self
        }

        fn submits(&self) -> usize {
            self.submits.load(Ordering::SeqCst)
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        fn downloads(&self) -> Vec<String> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderApi for Scripted {
        async fn submit(&self, _req: &GenerationRequest) -> kiln_client::Result<JobHandle> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            match &self.submit {
                Ok(id) => Ok(JobHandle::new(id.clone())),
                Err((status, body)) => Err(ClientError::rejected(*status, body.clone())),
            }
        }

        async fn fetch_status(&self, _handle: &JobHandle) -> kiln_client::Result<JobStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(JobStatus::Running))
        }

        async fn download_asset(&self, url: &str) -> kiln_client::Result<DownloadedAsset> {
            self.downloads.lock().unwrap().push(url.to_string());
            match self.download.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(DownloadedAsset {
                    bytes: vec![0xFF, 0xD8, 0xFF],
                    content_type: Some("image/jpeg".to_string()),
                }),
            }
        }
    }

    fn completed(url: &str) -> JobStatus {
        JobStatus::Completed {
            asset_url: url.to_string(),
        }
    }

    fn poller(provider: Arc<Scripted>) -> JobPoller {
        JobPoller::new(PollerConfig::default(), provider)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_job_is_downloaded() {
        let provider = Arc::new(
            Scripted::accepting("J1")
                .then(JobStatus::Pending)
                .then(JobStatus::Running)
                .then(completed(ASSET_URL)),
        );

        let asset = poller(provider.clone())
            .run("a red fox", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(asset.job_id, "J1");
        assert_eq!(asset.url, ASSET_URL);
        assert_eq!(asset.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(asset.polls, 3);
        assert_eq!(asset.elapsed, Duration::from_secs(6));
        assert!(asset.submitted_at <= chrono::Utc::now());
        assert_eq!(provider.downloads(), vec![ASSET_URL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_prompt_makes_no_calls() {
        let provider = Arc::new(Scripted::accepting("J1"));
        let poller = poller(provider.clone());

        for prompt in ["", "   \n\t"] {
            let err = poller.run(prompt, &CancellationToken::new()).await.unwrap_err();
            assert_eq!(err.kind(), FailureKind::InvalidInput);
        }
        assert_eq!(provider.submits(), 0);
        assert_eq!(provider.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_job_times_out() {
        let provider = Arc::new(Scripted::accepting("J2"));
        let poller = poller(provider.clone());

        let err = poller.run("castle", &CancellationToken::new()).await.unwrap_err();
        match err {
            GenerationError::TimedOut {
                job_id,
                elapsed,
                cancelled,
            } => {
                assert_eq!(job_id.as_deref(), Some("J2"));
                assert_eq!(elapsed, Duration::from_secs(60));
                assert!(!cancelled);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let polls = provider.polls();
        assert!((20..=21).contains(&polls), "{} polls", polls);
        assert_eq!(polls as u32, poller.config().max_polls());

        // Nothing keeps polling once the outcome is returned
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(provider.polls(), polls);
        assert!(provider.downloads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_not_multiple_of_interval() {
        let provider = Arc::new(Scripted::accepting("J2"));
        let config = PollerConfig::new(Duration::from_secs(3), Duration::from_secs(10));
        let poller = JobPoller::new(config, provider.clone());

        let err = poller.run("castle", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TimedOut { elapsed, .. } if elapsed == Duration::from_secs(10)
        ));
        // t = 0, 3, 6, 9 and the final check at 10
        assert_eq!(provider.polls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_stops_immediately() {
        for (status, by_provider) in [(JobStatus::Failed, false), (JobStatus::Cancelled, true)] {
            let provider = Arc::new(
                Scripted::accepting("J3")
                    .then(JobStatus::Running)
                    .then(status),
            );

            let err = poller(provider.clone())
                .run("castle", &CancellationToken::new())
                .await
                .unwrap_err();

            assert_eq!(
                err,
                GenerationError::JobFailed {
                    job_id: "J3".to_string(),
                    cancelled_by_provider: by_provider,
                }
            );
            assert!(!err.is_retry_later());
            assert_eq!(provider.polls(), 2);
            assert!(provider.downloads().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_rejection_skips_polling() {
        let provider = Arc::new(Scripted::rejecting(403, "{\"message\":\"invalid key\"}"));

        let err = poller(provider.clone())
            .run("castle", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::ProviderRejected {
                status: Some(403),
                body: "{\"message\":\"invalid key\"}".to_string(),
            }
        );
        assert_eq!(provider.submits(), 1);
        assert_eq!(provider.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_rejection_aborts_polling() {
        let provider = Arc::new(
            Scripted::accepting("J4")
                .then(JobStatus::Running)
                .then_error(ClientError::rejected(500, "upstream down")),
        );

        let started = Instant::now();
        let err = poller(provider.clone())
            .run("castle", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::ProviderRejected);
        assert_eq!(err.raw_body(), Some("upstream down"));
        assert_eq!(provider.polls(), 2);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognised_completion_is_schema_mismatch() {
        let raw = r#"{"data":{"status":"completed","result":{}}}"#;
        let provider = Arc::new(Scripted::accepting("J5").then_error(ClientError::SchemaMismatch {
            body: raw.to_string(),
        }));

        let err = poller(provider.clone())
            .run("castle", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::SchemaMismatch);
        assert_eq!(err.raw_body(), Some(raw));
        assert!(provider.downloads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failure_is_asset_unavailable() {
        let provider = Arc::new(
            Scripted::accepting("J6")
                .then(completed(ASSET_URL))
                .failing_download("HTTP 404 Not Found"),
        );

        let err = poller(provider.clone())
            .run("castle", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::AssetUnavailable {
                url: ASSET_URL.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let provider = Arc::new(
            Scripted::accepting("J7")
                .then(JobStatus::Unknown(serde_json::json!({"state": "warming"})))
                .then(completed(ASSET_URL)),
        );

        let asset = poller(provider.clone())
            .run("castle", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(asset.polls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_wakes_sleeping_poller() {
        let provider = Arc::new(Scripted::accepting("J8"));
        let poller = Arc::new(poller(provider.clone()));
        let cancel = CancellationToken::new();

        let started = Instant::now();
        let task = poller.spawn("castle", cancel.clone());

        // Polls at t=0 and t=3, then asleep until t=6
        time::sleep(Duration::from_secs(4)).await;
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        match err {
            GenerationError::TimedOut {
                job_id, cancelled, ..
            } => {
                assert_eq!(job_id.as_deref(), Some("J8"));
                assert!(cancelled);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert_eq!(provider.polls(), 2);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_submit() {
        let provider = Arc::new(Scripted::accepting("J9"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poller(provider.clone()).run("castle", &cancel).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TimedOut {
                job_id: None,
                cancelled: true,
                ..
            }
        ));
        assert_eq!(provider.polls(), 0);
    }

    /// Provider whose status checks take `delay` before answering
    struct Slow {
        delay: Duration,
        reject: bool,
        polls: AtomicUsize,
    }

    #[async_trait]
    impl ProviderApi for Slow {
        async fn submit(&self, _req: &GenerationRequest) -> kiln_client::Result<JobHandle> {
            Ok(JobHandle::new("JH"))
        }

        async fn fetch_status(&self, _handle: &JobHandle) -> kiln_client::Result<JobStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.delay).await;
            if self.reject {
                return Err(ClientError::rejected(504, "gateway timeout"));
            }
            Ok(JobStatus::Running)
        }

        async fn download_asset(&self, url: &str) -> kiln_client::Result<DownloadedAsset> {
            panic!("unexpected download of {}", url);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_status_check_in_flight() {
        for (delay, reject) in [(Duration::from_secs(45), false), (Duration::from_secs(30), true)] {
            let provider = Arc::new(Slow {
                delay,
                reject,
                polls: AtomicUsize::new(0),
            });
            let config = PollerConfig::new(Duration::from_secs(3), Duration::from_secs(10));
            let poller = JobPoller::new(config, provider.clone());

            let started = Instant::now();
            let err = poller.run("castle", &CancellationToken::new()).await.unwrap_err();

            assert_eq!(
                err,
                GenerationError::TimedOut {
                    job_id: Some("JH".to_string()),
                    elapsed: Duration::from_secs(10),
                    cancelled: false,
                }
            );
            assert_eq!(started.elapsed(), Duration::from_secs(10));
            assert_eq!(provider.polls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_check_before_deadline_keeps_polling() {
        let provider = Arc::new(Slow {
            delay: Duration::from_secs(4),
            reject: false,
            polls: AtomicUsize::new(0),
        });
        let config = PollerConfig::new(Duration::from_secs(3), Duration::from_secs(10));
        let poller = JobPoller::new(config, provider.clone());

        let err = poller.run("castle", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TimedOut { elapsed, cancelled: false, .. } if elapsed == Duration::from_secs(10)
        ));
        // Checks start at t=0 and t=7; the second is cut off at t=10
        assert_eq!(provider.polls.load(Ordering::SeqCst), 2);
    }

    /// Provider whose job ids and asset bytes echo the prompt
    ///
    /// A job submitted as "slow" never finishes.
    struct Echo;

    #[async_trait]
    impl ProviderApi for Echo {
        async fn submit(&self, req: &GenerationRequest) -> kiln_client::Result<JobHandle> {
            Ok(JobHandle::new(req.prompt.clone()))
        }

        async fn fetch_status(&self, handle: &JobHandle) -> kiln_client::Result<JobStatus> {
            if handle.id() == "slow" {
                return Ok(JobStatus::Running);
            }
            Ok(JobStatus::Completed {
                asset_url: format!("https://cdn.example.com/{}.png", handle.id()),
            })
        }

        async fn download_asset(&self, url: &str) -> kiln_client::Result<DownloadedAsset> {
            Ok(DownloadedAsset {
                bytes: url.as_bytes().to_vec(),
                content_type: Some("image/png".to_string()),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_invocations_are_independent() {
        let poller = Arc::new(JobPoller::new(PollerConfig::default(), Arc::new(Echo)));

        let slow_cancel = CancellationToken::new();
        let slow = poller.spawn("slow", slow_cancel.clone());
        let fast = poller.spawn("fast", CancellationToken::new());
        let other = poller.spawn("other", CancellationToken::new());

        let fast = fast.await.unwrap().unwrap();
        assert_eq!(fast.job_id, "fast");
        assert_eq!(fast.bytes, b"https://cdn.example.com/fast.png".to_vec());
        assert_eq!(fast.polls, 1);

        let other = other.await.unwrap().unwrap();
        assert_eq!(other.bytes, b"https://cdn.example.com/other.png".to_vec());

        // The slow job is still sleeping between checks; cancelling it touches nothing else
        assert!(!slow.is_finished());
        slow_cancel.cancel();
        let err = slow.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TimedOut { job_id: Some(ref id), cancelled: true, .. } if id == "slow"
        ));
    }
}
