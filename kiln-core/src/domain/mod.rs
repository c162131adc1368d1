//! Core domain types
//!
//! These types are shared between the provider client (which produces them
//! from HTTP responses) and the poller (which drives one invocation with them).

pub mod asset;
pub mod job;
pub mod request;
