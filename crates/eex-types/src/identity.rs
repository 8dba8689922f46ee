//! Composite event identifier decoding.
//!
//! The transparency platform publishes every revision of a nonavailability event under
//! its own identifier, `{unit}#{event}_{version}`, with zero padding on the unit and
//! version segments (for example `0012#034_0007`). Decoding recovers the logical event
//! the revision belongs to and the revision number.

use regex::Regex;
use std::sync::OnceLock;

/// Leading zeros, lazy unit segment, `#`, lazy event segment, `_`, zero-padded version.
const IDENTIFIER_PATTERN: &str = r"^0*(.+?)#(.+?)_0*(\d+)$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

/// Logical id and version count decoded from a composite identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    /// `{unit}#{event}` with the unit's leading zeros stripped.
    pub logical_id: String,
    /// Revision number; higher is more recent.
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("unparseable event identifier '{0}'")]
    Unparseable(String),
}

/// Decode a composite identifier into its logical id and version count.
///
/// Any identifier that does not match all three segments, or whose version does not fit
/// a `u32`, is rejected.
pub fn decode(identifier: &str) -> Result<EventIdentity, IdentityError> {
    let unparseable = || IdentityError::Unparseable(identifier.to_string());

    let caps = identifier_regex()
        .captures(identifier)
        .filter(|c| c.len() == 4)
        .ok_or_else(unparseable)?;

    let (Some(unit), Some(event), Some(version)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return Err(unparseable());
    };

    let version = version.as_str().parse::<u32>().map_err(|_| unparseable())?;

    Ok(EventIdentity {
        logical_id: format!("{}#{}", unit.as_str(), event.as_str()),
        version,
    })
}
