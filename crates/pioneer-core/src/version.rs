//! Index schema versioning and compatibility checks.

/// Application version displayed to users.
pub const VERSION_STRING: &str = "2.1.0";

/// Schema version written into new index files. Bump when the on-disk
/// format changes.
pub const INDEX_SCHEMA_VERSION: &str = "2.1.0";
pub const INDEX_SCHEMA_MAJOR: u32 = 2;

/// Oldest schema version this reader still accepts.
pub const MIN_COMPAT_SCHEMA_MAJOR: u32 = 1;
pub const MIN_COMPAT_SCHEMA_MINOR: u32 = 2;

/// Human-readable form of the minimum compatible version, for diagnostics.
pub fn min_compat_version() -> String {
    format!("{MIN_COMPAT_SCHEMA_MAJOR}.{MIN_COMPAT_SCHEMA_MINOR}.0")
}

/// Parse a `"major.minor.patch"` version string.
pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Whether an index file with the given schema version can be loaded.
///
/// Same major version is always compatible; older majors must meet the
/// minimum compatible major.minor. Future majors are rejected.
pub fn is_schema_compatible(major: u32, minor: u32) -> bool {
    if major == INDEX_SCHEMA_MAJOR {
        return true;
    }
    if major > MIN_COMPAT_SCHEMA_MAJOR {
        return false;
    }
    major == MIN_COMPAT_SCHEMA_MAJOR && minor >= MIN_COMPAT_SCHEMA_MINOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_versions() {
        assert_eq!(parse_version("2.1.0"), Some((2, 1, 0)));
        assert_eq!(parse_version("0.9.0"), Some((0, 9, 0)));
        assert_eq!(parse_version("10.20.30"), Some((10, 20, 30)));
    }

    #[test]
    fn parse_invalid_versions() {
        assert_eq!(parse_version("2.1"), None);
        assert_eq!(parse_version("2.1.0.4"), None);
        assert_eq!(parse_version("a.b.c"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn current_schema_is_compatible() {
        assert!(is_schema_compatible(2, 0));
        assert!(is_schema_compatible(2, 1));
        assert!(is_schema_compatible(2, 99));
    }

    #[test]
    fn minimum_compatible_schema_accepted() {
        assert!(is_schema_compatible(1, 2));
        assert!(is_schema_compatible(1, 3));
    }

    #[test]
    fn old_and_future_schemas_rejected() {
        assert!(!is_schema_compatible(1, 1));
        assert!(!is_schema_compatible(1, 0));
        assert!(!is_schema_compatible(0, 9));
        assert!(!is_schema_compatible(3, 0));
    }
}
