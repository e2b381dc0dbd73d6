//! Core logging types: dependency entries, status, and the [`Log`] trait.

/// Outcome of converging one dependency, for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Checkout path of the dependency.
    pub name: String,
    /// Final status of the dependency.
    pub status: DependencyStatus,
    /// Optional detail message (e.g., skip reason or target revision).
    pub message: Option<String>,
}

/// Status of a processed dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    /// The checkout was already at the requested revision.
    UpToDate,
    /// The checkout was cloned during this run.
    Cloned,
    /// The working tree was switched to a different revision.
    Updated,
    /// The entry was skipped (skip set, no resolvable source or revision).
    Skipped,
    /// Mutations are disabled; the change was only logged.
    DryRun,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) emits through `tracing`;
/// [`MemoryLog`](super::MemoryLog) captures messages for callers that embed
/// the engine and for tests.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a dependency result for the summary.
    fn record(&self, name: &str, status: DependencyStatus, message: Option<&str>);
}
