//! Shared types for the eex-nonavailability workspace.
//!
//! This crate provides the record types used across the fetch, reconcile and export
//! stages, breaking the dependency between transport and application code.
//!
//! ## Event Types
//!
//! The [`event`] module contains the two phases of a fetched record:
//! - [`RawEvent`](event::RawEvent) - Immutable record as delivered by the remote API
//! - [`Event`](event::Event) - Raw record paired with its decoded [`EventIdentity`]
//!
//! The [`identity`] module decodes composite event identifiers into a logical id and
//! a version count.

pub mod env_utils;
pub mod event;
pub mod identity;

// Re-export commonly used event types at crate root
pub use event::{Event, RawEvent};
pub use identity::{decode, EventIdentity, IdentityError};

use std::time::Duration;

/// Configuration for retry behavior on remote calls.
///
/// The delay is fixed: no jitter, no exponential growth.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of invocations, the first attempt included.
    pub max_attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryConfig {
    /// Create a new RetryConfig with the specified parameters.
    pub fn new(max_attempts: u32, delay_secs: u64) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_secs(delay_secs),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(15),
        }
    }
}
