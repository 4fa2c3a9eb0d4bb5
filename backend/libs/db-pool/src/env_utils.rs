//! Environment variable parsing helpers
//!
//! Missing or unparsable values fall back to the provided default instead of
//! failing, so callers never need `unwrap()` on configuration reads.

use std::str::FromStr;

/// Parse an environment variable with a default fallback
///
/// ```ignore
/// let port: u16 = parse_env_with_default("FORUM_PORT", 5000);
/// ```
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a string variable with a default
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
