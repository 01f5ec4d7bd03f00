//! Configuration Registry Module
//!
//! Owns the set of loaded configuration sources and the shared directory
//! client, and exposes typed accessors over the global HA configuration.

pub mod config_registry;

pub use config_registry::*;

/// Major component of a dotted version string (`"2.0.0-beta"` -> `"2"`)
///
/// Returns `None` when the leading component is empty.
pub fn major_version_of(version: &str) -> Option<&str> {
    let major = version.trim().split('.').next()?.trim();
    if major.is_empty() {
        None
    } else {
        Some(major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_version_of() {
        assert_eq!(major_version_of("2.0.0-beta"), Some("2"));
        assert_eq!(major_version_of("10.3"), Some("10"));
        assert_eq!(major_version_of("7"), Some("7"));
        assert_eq!(major_version_of(""), None);
        assert_eq!(major_version_of(".1.2"), None);
    }
}
