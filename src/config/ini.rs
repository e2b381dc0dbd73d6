//! Minimal in-place editing of INI-style files such as Mercurial's `hgrc`.
//!
//! Only the lines that change are touched; comments, ordering and unrelated
//! sections survive an edit.

/// Look up `key` in `[section]`.
///
/// Inline comments are not stripped; Mercurial does not support them.
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::config::ini::get_value;
///
/// let hgrc = "[paths]\ndefault = https://hg.example.org/core\n";
/// assert_eq!(
///     get_value(hgrc, "paths", "default").as_deref(),
///     Some("https://hg.example.org/core")
/// );
/// assert_eq!(get_value(hgrc, "ui", "username"), None);
/// ```
#[must_use]
pub fn get_value(content: &str, section: &str, key: &str) -> Option<String> {
    let mut current: Option<String> = None;
    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(header) = parse_raw_header(trimmed) {
            current = Some(header);
        } else if current.as_deref() == Some(section)
            && let Some((k, v)) = parse_kv_line(trimmed)
            && k == key
        {
            return Some(v);
        }
    }
    None
}

/// Return `content` with `key = value` set in `[section]`.
///
/// Replaces the first existing assignment of `key` in that section, appends
/// the key after the section's last entry if absent, or appends a new
/// section at the end of the file.
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::config::ini::set_value;
///
/// let updated = set_value("[paths]\ndefault = x\n", "ui", "ignore.deps", "/r/.hg/deps");
/// assert_eq!(updated, "[paths]\ndefault = x\n\n[ui]\nignore.deps = /r/.hg/deps\n");
/// ```
#[must_use]
pub fn set_value(content: &str, section: &str, key: &str, value: &str) -> String {
    let assignment = format!("{key} = {value}");
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let mut in_section = false;
    let mut insert_at: Option<usize> = None;
    for (idx, line) in lines.iter_mut().enumerate() {
        let trimmed = line.trim();
        if let Some(header) = parse_raw_header(trimmed) {
            in_section = header == section;
            if in_section {
                insert_at = Some(idx + 1);
            }
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((k, _)) = parse_kv_line(trimmed)
            && k == key
        {
            assignment.clone_into(line);
            return finish(&lines);
        }
        if !trimmed.is_empty() {
            insert_at = Some(idx + 1);
        }
    }

    if let Some(idx) = insert_at {
        lines.insert(idx, assignment);
    } else {
        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push(format!("[{section}]"));
        lines.push(assignment);
    }
    finish(&lines)
}

fn finish(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` line.  Comment lines yield `None`.
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    if line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}
