//! Line-oriented ignore files shared by both backends.
use anyhow::{Context as _, Result};
use std::path::Path;

use crate::helpers::fs::create_parent_dirs;

/// Append `line` to the file at `path` unless an identical (whitespace
/// trimmed) line is already present.
///
/// Creates the file and its parent directories when missing.  Existing
/// content is preserved byte for byte.  Returns `true` if the line was
/// added.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn ensure_line(path: &Path, line: &str) -> Result<bool> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("reading {}", path.display())));
        }
    };

    if existing.lines().any(|l| l.trim() == line) {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');

    create_parent_dirs(path)?;
    std::fs::write(path, updated).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}
