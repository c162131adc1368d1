//! Scheduler layer for the poller
//!
//! This layer runs the per-invocation state machine: submitting the job,
//! polling its status on a fixed interval, and fetching the finished asset.

pub mod poller;
pub mod state;

pub use poller::JobPoller;
pub use state::InvocationState;
