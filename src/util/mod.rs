//
//  atlas-client
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Utility Module
//!
//! Small helpers shared by the client, upload, and archive layers.
//!
//! ## Categories
//!
//! - **Logging Helpers**: [`mask_token`] keeps credentials out of log output
//! - **Size Utilities**: [`format_size`] renders byte counts for log lines
//! - **Path Utilities**: [`join_path`] joins URL path segments
//!
//! ## Example
//!
//! ```rust
//! use atlas_client::util::{format_size, mask_token};
//!
//! assert_eq!(mask_token("abcdef"), "abc*** (masked)");
//! assert_eq!(format_size(1536), "1.5 KB");
//! ```

/// Masks a secret for inclusion in log output.
///
/// The first three characters are kept so that different tokens remain
/// distinguishable in logs; everything else is replaced.
///
/// # Parameters
///
/// * `secret` - The token or password to mask.
///
/// # Returns
///
/// The masked representation, e.g. `"abc*** (masked)"`.
///
/// # Example
///
/// ```rust
/// use atlas_client::util::mask_token;
///
/// assert_eq!(mask_token("a.atlasv1.b"), "a.a*** (masked)");
/// assert_eq!(mask_token("abc"), "*** (masked)");
/// ```
pub fn mask_token(secret: &str) -> String {
    let mut chars = secret.chars();
    let prefix: String = chars.by_ref().take(3).collect();

    if chars.next().is_none() {
        return "*** (masked)".to_string();
    }

    format!("{}*** (masked)", prefix)
}

/// Formats a byte count as a human-readable size string.
///
/// # Parameters
///
/// * `bytes` - The size in bytes to format.
///
/// # Returns
///
/// A `String` containing the formatted size with an appropriate unit suffix.
///
/// # Example
///
/// ```rust
/// use atlas_client::util::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1048576), "1.0 MB");
/// ```
///
/// # Notes
///
/// - Uses binary units (1 KB = 1024 bytes).
/// - Values less than 1 KB are shown as whole bytes without decimals.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Joins a base URL path with a request sub-path.
///
/// Redundant slashes at the seam are collapsed and a trailing slash on the
/// result is dropped, so `"/"` + `"/api/v1/x/"` yields `"/api/v1/x"`.
///
/// # Example
///
/// ```rust
/// use atlas_client::util::join_path;
///
/// assert_eq!(join_path("/foo/bar", "/api/v1/token"), "/foo/bar/api/v1/token");
/// assert_eq!(join_path("/", "api"), "/api");
/// ```
pub fn join_path(base: &str, path: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdef"), "abc*** (masked)");
        assert_eq!(mask_token("abcd"), "abc*** (masked)");
        assert_eq!(mask_token("abc"), "*** (masked)");
        assert_eq!(mask_token(""), "*** (masked)");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/api/v1/token"), "/api/v1/token");
        assert_eq!(join_path("/foo/bar/", "api/v2/"), "/foo/bar/api/v2");
        assert_eq!(join_path("/", "/"), "/");
    }
}
