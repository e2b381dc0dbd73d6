//! Dependency path validation.
//!
//! Every checkout target and every `_self` location is computed through
//! [`safe_join`]; nothing else in the crate joins manifest-supplied paths.
use std::path::{Path, PathBuf};

use crate::error::PathError;

/// Normalize a `/`-separated relative path lexically.
///
/// Collapses repeated separators, drops `.` components and folds `..` into
/// the preceding component where one exists.  Leading `..` components are
/// kept for relative input and dropped for absolute input.  An empty result
/// is `"."`.
#[must_use]
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push(part);
                }
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join the manifest-relative `subpath` onto `base`.
///
/// # Errors
///
/// - [`PathError::IllegalSeparator`] if `subpath` contains a platform
///   separator other than `/`
/// - [`PathError::Absolute`] if the normalized path is absolute
/// - [`PathError::OutsideRepository`] if the normalized path climbs above
///   `base`
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ensure_deps_cli::paths::safe_join;
///
/// let joined = safe_join(Path::new("/repo"), "a/./b//c").unwrap();
/// assert_eq!(joined, Path::new("/repo/a/b/c"));
/// assert!(safe_join(Path::new("/repo"), "a/../../b").is_err());
/// ```
pub fn safe_join(base: &Path, subpath: &str) -> Result<PathBuf, PathError> {
    if subpath.chars().any(|c| c != '/' && std::path::is_separator(c)) {
        return Err(PathError::IllegalSeparator(subpath.to_string()));
    }

    let normalized = normalize(subpath);
    if normalized.starts_with('/') {
        return Err(PathError::Absolute(subpath.to_string()));
    }
    if normalized == ".." || normalized.starts_with("../") {
        return Err(PathError::OutsideRepository(subpath.to_string()));
    }

    let mut joined = base.to_path_buf();
    for component in normalized.split('/').filter(|c| *c != ".") {
        joined.push(component);
    }
    Ok(joined)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> PathBuf {
        PathBuf::from("/repo")
    }

    #[test]
    fn nested_path_is_joined_component_wise() {
        assert_eq!(
            safe_join(&base(), "a/b/c").unwrap(),
            PathBuf::from("/repo/a/b/c")
        );
    }

    #[test]
    fn parent_prefix_is_rejected() {
        assert_eq!(
            safe_join(&base(), "../x"),
            Err(PathError::OutsideRepository("../x".to_string()))
        );
    }

    #[test]
    fn bare_parent_is_rejected() {
        assert!(matches!(
            safe_join(&base(), ".."),
            Err(PathError::OutsideRepository(_))
        ));
    }

    #[test]
    fn absolute_path_is_rejected() {
        assert_eq!(
            safe_join(&base(), "/x"),
            Err(PathError::Absolute("/x".to_string()))
        );
    }

    #[test]
    fn escaping_through_inner_parent_is_rejected() {
        assert!(matches!(
            safe_join(&base(), "a/../../b"),
            Err(PathError::OutsideRepository(_))
        ));
    }

    #[test]
    fn inner_parent_that_stays_inside_is_allowed() {
        assert_eq!(
            safe_join(&base(), "a/../b").unwrap(),
            PathBuf::from("/repo/b")
        );
    }

    #[test]
    fn dot_resolves_to_base() {
        let joined = safe_join(&base(), ".").unwrap();
        assert_eq!(joined.components().count(), base().components().count());
    }

    #[test]
    fn names_starting_with_dots_are_not_parents() {
        assert_eq!(
            safe_join(&base(), "..hidden/x").unwrap(),
            PathBuf::from("/repo/..hidden/x")
        );
    }

    #[test]
    #[cfg(windows)]
    fn backslash_is_rejected_on_windows() {
        assert!(matches!(
            safe_join(&base(), "a\\..\\..\\b"),
            Err(PathError::IllegalSeparator(_))
        ));
    }

    #[test]
    #[cfg(not(windows))]
    fn backslash_is_a_plain_character_elsewhere() {
        assert_eq!(
            safe_join(&base(), "a\\b").unwrap(),
            PathBuf::from("/repo/a\\b")
        );
    }

    #[test]
    fn normalize_matches_posix_rules() {
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("a//b/./c/"), "a/b/c");
        assert_eq!(normalize("a/.."), ".");
        assert_eq!(normalize("../../a"), "../../a");
        assert_eq!(normalize("/../a"), "/a");
        assert_eq!(normalize("a/b/../../.."), "..");
    }
}
