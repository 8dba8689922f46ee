//! Environment variable parsing utilities.
//!
//! Settings for the exporter are read from `EEX_API_*` variables. These helpers keep the
//! lookups terse and treat blank values the same as unset ones, so a `.env` file with
//! `EEX_API_PASSWORD=` does not shadow a default.
//!
//! # Example
//!
//! ```
//! use eex_types::env_utils::{env_parse_or, env_string_or};
//!
//! let attempts: u32 = env_parse_or("EEX_API_RETRY_ATTEMPTS", 5).unwrap_or(5);
//! let company = env_string_or("EEX_API_COMPANY_ID", "EON_EnergyDE");
//! ```

use std::str::FromStr;

/// Read an environment variable, returning `None` when unset or blank.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable as a string with a default value.
pub fn env_string_or(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset or blank.
///
/// A value that is present but does not parse is an error, not a silent default.
pub fn env_parse_or<T: FromStr>(key: &str, default: T) -> Result<T, T::Err> {
    match env_string(key) {
        Some(v) => v.parse(),
        None => Ok(default),
    }
}

/// Check if an environment variable is set to a truthy value, with a default.
///
/// `1`, `true`, `yes` and `on` (case-insensitive) are truthy.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match env_string(key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}
