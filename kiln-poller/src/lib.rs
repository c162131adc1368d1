//! Kiln Poller
//!
//! Drives one image-generation invocation from prompt to asset bytes.
//!
//! Architecture:
//! - Configuration: interval, deadline and request defaults
//! - Scheduler: the submit → poll → download state machine, one task per invocation
//!
//! The poller never retries a provider call by itself. Every invocation ends
//! in exactly one [`GenerationOutcome`], success or a classified failure.

pub mod config;
pub mod scheduler;

pub use config::PollerConfig;
pub use kiln_core::{FailureKind, GeneratedAsset, GenerationError, GenerationOutcome};
pub use scheduler::{InvocationState, JobPoller};
pub use tokio_util::sync::CancellationToken;
