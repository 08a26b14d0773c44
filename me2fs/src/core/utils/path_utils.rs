// SPDX-License-Identifier: MIT

//! Path helpers for walking an on-disk namespace.
//!
//! Paths are `/`-separated byte strings; no encoding is assumed beyond that.
//! All functions are no_std + alloc safe.

use alloc::{string::String, vec::Vec};

/// Returns `true` if the path starts at the root.
#[inline]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Splits a path into its non-empty components.
///
/// `"/a//b/"` gives `["a", "b"]`. `.` and `..` are kept verbatim: they are
/// real directory entries on ext2 and are resolved by lookup.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Join two path components with `/`, ensuring no duplicate slash.
pub fn join_paths(base: &str, part: &str) -> String {
    let base = base.trim_end_matches('/');
    let part = part.trim_start_matches('/');
    let mut out = String::with_capacity(base.len() + part.len() + 1);
    out.push_str(base);
    out.push('/');
    out.push_str(part);
    out
}

/// Returns `true` if the path ends with a wildcard component (`/*`).
pub fn is_wildcard(path: &str) -> bool {
    path == "*" || path.ends_with("/*")
}

/// Removes the wildcard suffix, if present. `"dir/*"` gives `"dir"`, `"/*"`
/// gives `"/"`.
pub fn strip_wildcard(path: &str) -> &str {
    match path.strip_suffix("/*") {
        Some("") => "/",
        Some(base) => base,
        None if path == "*" => "/",
        None => path,
    }
}

/// Extracts the last component of the path. The root has the name `/`.
pub fn extract_name_from_path(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit('/').next() {
        Some("") | None => "/",
        Some(name) => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_utils_basic() {
        assert!(is_absolute("/etc/passwd"));
        assert!(!is_absolute("etc"));

        assert_eq!(split_path("/a//b/c/"), ["a", "b", "c"]);
        assert_eq!(split_path("../x/."), ["..", "x", "."]);
        assert!(split_path("/").is_empty());

        assert_eq!(join_paths("/", "foo"), "/foo");
        assert_eq!(join_paths("/dir/", "/file"), "/dir/file");

        assert!(is_wildcard("dir/*"));
        assert!(!is_wildcard("dir/a*"));
        assert_eq!(strip_wildcard("dir/*"), "dir");
        assert_eq!(strip_wildcard("/*"), "/");

        assert_eq!(extract_name_from_path("/path/to/file.txt"), "file.txt");
        assert_eq!(extract_name_from_path("/path/to/dir/"), "dir");
        assert_eq!(extract_name_from_path("/"), "/");
    }
}
