// # URL Base
//
// A URL base is the domain suffix shared by every device record, e.g. `.lan`
// or `.devices.example.com`. It is used in two different spellings:
//
// - **Record suffix**: leading dot, no trailing dot (`.lan`). Appended to a
//   device's url label to form the record name (`dev1` -> `dev1.lan`).
// - **Zone name**: no leading dot, trailing dot (`lan.`). Compared against
//   hosted zone names, which providers report fully qualified.
//
// The two spellings are NOT interchangeable. Mixing them up makes zone
// lookups miss.

use crate::{Error, Result};
use std::fmt;

/// A URL base as given on the command line, normalized to its dotted form
///
/// # Example
///
/// ```rust
/// use dnsbatch_core::UrlBase;
///
/// let base = UrlBase::parse("example.com").unwrap();
/// assert_eq!(base.record_suffix(), ".example.com");
/// assert_eq!(base.zone_name(), "example.com.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBase {
    /// Always starts with `.`
    dotted: String,
}

impl UrlBase {
    /// Parse a URL base, prepending a leading `.` if absent
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty (or whitespace-only) input, or
    /// for a bare `.`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "." {
            return Err(Error::config("URL base cannot be empty"));
        }

        let dotted = if raw.starts_with('.') {
            raw.to_string()
        } else {
            format!(".{raw}")
        };

        Ok(Self { dotted })
    }

    /// Suffix appended to a device url label to build its record name
    pub fn record_suffix(&self) -> &str {
        &self.dotted
    }

    /// Fully qualified name to match against hosted zone names
    pub fn zone_name(&self) -> String {
        normalize_zone_name(&self.dotted)
    }

    /// Record name for a device url label
    pub fn record_name(&self, label: &str) -> String {
        format!("{label}{}", self.dotted)
    }
}

impl fmt::Display for UrlBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

/// Normalize a domain suffix for zone lookup
///
/// Strips a single leading `.` if present, then appends a trailing `.` if
/// absent. Applying it twice yields the same result.
pub fn normalize_zone_name(base: &str) -> String {
    let name = base.strip_prefix('.').unwrap_or(base);
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}
