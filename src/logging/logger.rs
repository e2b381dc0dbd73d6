//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{DependencyEntry, DependencyStatus, Log};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Messages go through `tracing`; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) writes them to the
/// console and to `$XDG_CACHE_HOME/ensure-deps/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<DependencyEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary.  The file
    /// itself is created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<DependencyEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a dependency result for the summary.
    pub fn record(&self, name: &str, status: DependencyStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(DependencyEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Print the summary of all recorded dependencies.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut up_to_date = 0u32;
        let mut cloned = 0u32;
        let mut updated = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;

        for entry in &entries {
            let (icon, color) = match entry.status {
                DependencyStatus::UpToDate => {
                    up_to_date += 1;
                    ("·", "\x1b[2m")
                }
                DependencyStatus::Cloned => {
                    cloned += 1;
                    ("+", "\x1b[32m")
                }
                DependencyStatus::Updated => {
                    updated += 1;
                    ("✓", "\x1b[32m")
                }
                DependencyStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                DependencyStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        let total = up_to_date + cloned + updated + skipped + dry_run;
        self.info(&format!(
            "{total} dependencies: \x1b[32m{cloned} cloned\x1b[0m, \x1b[32m{updated} updated\x1b[0m, \x1b[2m{up_to_date} up to date\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.debug(&format!("log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, name: &str, status: DependencyStatus, message: Option<&str>) {
        self.record(name, status, message);
    }
}
