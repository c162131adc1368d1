//! Kiln Core
//!
//! Core types for the Kiln image-generation job orchestrator.
//!
//! This crate contains:
//! - Domain types: generation requests, job handles, job statuses, assets
//! - Error taxonomy: the classified failures an invocation can end with
//! - Schema probing: priority-ordered field lookup in provider responses

pub mod domain;
pub mod error;
pub mod probe;

pub use domain::asset::GeneratedAsset;
pub use domain::job::{JobHandle, JobStatus, ProviderState};
pub use domain::request::GenerationRequest;
pub use error::{FailureKind, GenerationError, GenerationOutcome};
