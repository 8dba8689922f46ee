//! EEX Transport Layer
//!
//! Remote access to the EEX transparency platform's nonavailability events.
//!
//! This crate provides:
//! - [`source`]: the [`EventSource`] abstraction, query parameters and response envelope
//! - [`http`]: [`EexClient`], a blocking `ureq` implementation of [`EventSource`]
//! - [`retry`]: bounded fixed-delay retry on "service unavailable"
//! - [`fetcher`]: [`WindowFetcher`], one retried, fail-soft query per time window
//!
//! # Example
//!
//! ```ignore
//! use eex_transport::{EexClient, EexClientConfig, WindowFetcher};
//! use eex_types::RetryConfig;
//!
//! let client = EexClient::new(EexClientConfig { ..Default::default() });
//! let fetcher = WindowFetcher::new(client, RetryConfig::default());
//! let events = fetcher.fetch("EON_EnergyDE", start, end);
//! ```

pub mod fetcher;
pub mod http;
pub mod retry;
pub mod source;
pub mod test_utils;

// Re-export main types for convenience
pub use fetcher::{FetchError, WindowFetcher};
pub use http::{EexClient, EexClientConfig};
pub use retry::{with_retries_and_sleep, Attempt, RetryError};
pub use source::{EventQuery, EventSource, ResultList, ResultSet, SourceError};
