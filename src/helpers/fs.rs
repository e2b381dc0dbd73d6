//! Small file-system operations shared by the ignore writers and self-update.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Create every missing directory above `file`.
///
/// A Git repository initialised without templates has no `.git/info/`,
/// so the exclude writer calls this before appending.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn create_parent_dirs(file: &Path) -> Result<()> {
    let Some(parent) = file.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))
}

/// Delete a leftover file such as a staged `.new` binary or a displaced
/// `.old` one. A dangling symlink counts as leftover.
///
/// # Errors
///
/// Returns an error if the file is there but cannot be deleted.
pub fn remove_stale_file(path: &Path) -> Result<()> {
    if path.symlink_metadata().is_err() {
        return Ok(());
    }
    std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_info_directory() {
        let repo = tempfile::tempdir().unwrap();
        let exclude = repo.path().join(".git").join("info").join("exclude");
        create_parent_dirs(&exclude).unwrap();
        assert!(repo.path().join(".git").join("info").is_dir());
        assert!(!exclude.exists());
    }

    #[test]
    fn existing_parent_is_fine() {
        let repo = tempfile::tempdir().unwrap();
        create_parent_dirs(&repo.path().join("hgrc")).unwrap();
    }

    #[test]
    fn staged_binary_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("ensure-deps.new");
        std::fs::write(&staged, "stale").unwrap();
        remove_stale_file(&staged).unwrap();
        assert!(!staged.exists());
    }

    #[test]
    fn absent_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        remove_stale_file(&dir.path().join("ensure-deps.old")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("ensure-deps.old");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();
        remove_stale_file(&link).unwrap();
        assert!(link.symlink_metadata().is_err());
    }
}
