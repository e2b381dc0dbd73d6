//! Domain-specific error types for the dependency engine.
//!
//! Internal modules return typed errors where a caller may want to match on
//! the failure (path safety, unresolvable revisions, unreadable manifests).
//! Everything that shells out to a version-control tool uses
//! [`anyhow::Error`] with context attached, and the CLI boundary converts
//! the typed errors through the standard `?` operator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`safe_join`](crate::paths::safe_join).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    /// The path contains a platform separator other than `/`.
    #[error("Illegal directory separator in dependency path {0}")]
    IllegalSeparator(String),

    /// The normalized path is absolute.
    #[error("Dependency path {0} cannot be absolute")]
    Absolute(String),

    /// The normalized path climbs above the repository root.
    #[error("Dependency path {0} has to be inside the repository")]
    OutsideRepository(String),
}

/// Errors raised while reading a manifest file.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// An I/O error other than "file not found" occurred.
    #[error("IO error reading manifest {path}: {source}")]
    Io {
        /// Path to the manifest that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the resolution engine.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The revision is unknown even after pulling from the remote.
    #[error("Failed to resolve revision {revision} in {}", target.display())]
    UnknownRevision {
        /// The revision reference from the manifest.
        revision: String,
        /// Checkout in which the lookup failed.
        target: PathBuf,
    },

    /// A backend token was selected that has no registered implementation.
    #[error("No backend registered for {0}")]
    UnknownBackend(String),
}
