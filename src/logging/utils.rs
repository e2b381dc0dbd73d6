//! Helpers for the log file: its location, timestamps, and colour removal.
use std::fs;
use std::path::PathBuf;

/// Drop terminal escape sequences so the log file holds plain text.
///
/// Covers `ESC [` control sequences up to their final byte (`@` to `~`).
/// A lone `ESC` swallows the character after it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            chars.by_ref().find(|c| ('@'..='~').contains(c));
        }
    }
    out
}

/// `ensure-deps/` under the user cache directory, created on demand.
///
/// Honours `XDG_CACHE_HOME`, then falls back to `~/.cache` using `HOME`
/// or `USERPROFILE`.
fn log_dir() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CACHE_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".cache"),
    };
    let dir = base.join("ensure-deps");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Where the log of a `command` run goes. Each run overwrites the last.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    Some(log_dir()?.join(format!("{command}.log")))
}

/// Run start time for the log header, in UTC.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Per-line timestamp in the log file, in UTC.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
