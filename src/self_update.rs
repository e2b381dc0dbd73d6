//! Replacing the running binary with the canonical copy named by `_self`.
//!
//! The engine only reports where the canonical binary lives; the command
//! layer compares it with the running executable, installs it, and the
//! entry point restarts into it.
use anyhow::{Context as _, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::helpers::fs::remove_stale_file;

/// Result of comparing the canonical binary with the running one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdate {
    /// The canonical binary does not exist.
    SourceMissing,
    /// Both binaries are identical.
    UpToDate {
        /// SHA-256 of both binaries.
        digest: String,
    },
    /// The binaries differ.
    Differs {
        /// SHA-256 of the running binary before any update.
        current: String,
        /// SHA-256 of the canonical binary.
        canonical: String,
    },
}

/// Compare `source` with `binary` without modifying anything.
///
/// # Errors
///
/// Returns an error if either file exists but cannot be read.
pub fn check(source: &Path, binary: &Path) -> Result<SelfUpdate> {
    if !source.is_file() {
        return Ok(SelfUpdate::SourceMissing);
    }
    let canonical = compute_sha256(source)?;
    let current = compute_sha256(binary)?;
    if canonical == current {
        return Ok(SelfUpdate::UpToDate { digest: current });
    }
    Ok(SelfUpdate::Differs { current, canonical })
}

/// Replace `binary` with `source` if they differ.
///
/// A [`SelfUpdate::Differs`] result means `binary` now holds the canonical
/// bytes.  Identical binaries are left untouched.
///
/// # Errors
///
/// Returns an error if the files cannot be read or the new binary cannot be
/// staged or moved into place.
pub fn apply(source: &Path, binary: &Path) -> Result<SelfUpdate> {
    let outcome = check(source, binary)?;
    if matches!(outcome, SelfUpdate::Differs { .. }) {
        let tmp = tmp_path(binary);
        remove_stale_file(&tmp)?;
        std::fs::copy(source, &tmp)
            .with_context(|| format!("staging {} at {}", source.display(), tmp.display()))?;
        install_binary(&tmp, binary)?;
    }
    Ok(outcome)
}

/// Replace the current process with `exe` run with `args`.
///
/// On Unix the process image is replaced and this only returns on failure.
/// Elsewhere `exe` runs as a child and its exit code is returned.
///
/// # Errors
///
/// Returns an error if `exe` cannot be executed.
pub fn restart(exe: &Path, args: &[OsString]) -> Result<ExitCode> {
    let mut command = std::process::Command::new(exe);
    command.args(args);
    run_replacement(&mut command).with_context(|| format!("restarting {}", exe.display()))
}

#[cfg(unix)]
fn run_replacement(command: &mut std::process::Command) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt as _;
    Err(command.exec().into())
}

#[cfg(not(unix))]
fn run_replacement(command: &mut std::process::Command) -> Result<ExitCode> {
    let status = command.status()?;
    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}

/// Path the new binary is staged at before it replaces `binary`.
fn tmp_path(binary: &Path) -> PathBuf {
    let mut name = binary
        .file_name()
        .map_or_else(|| OsString::from("ensure-deps"), std::ffi::OsStr::to_os_string);
    name.push(".new");
    binary.with_file_name(name)
}

/// Move the staged binary from `tmp` over `binary`.
///
/// A running executable cannot be overwritten on Windows but can be renamed,
/// so there the old binary is moved aside to `<name>.old` first.
fn install_binary(tmp: &Path, binary: &Path) -> Result<()> {
    if let Err(e) = std::fs::rename(tmp, binary) {
        if !cfg!(windows) {
            return Err(anyhow::Error::new(e).context(format!("installing {}", binary.display())));
        }
        let mut old = binary.as_os_str().to_os_string();
        old.push(".old");
        let old = PathBuf::from(old);
        remove_stale_file(&old)?;
        std::fs::rename(binary, &old)
            .with_context(|| format!("moving {} aside", binary.display()))?;
        std::fs::rename(tmp, binary)
            .with_context(|| format!("installing {}", binary.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(binary)
            .with_context(|| format!("reading {}", binary.display()))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(binary, perms).context("setting binary permissions")?;
    }
    Ok(())
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    Ok(hex)
}
