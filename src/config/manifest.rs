//! The `dependencies` manifest of a repository.
use std::path::Path;

use super::spec::{DependencySpec, ParsedLine, SourceKey, ValueSpec, parse_line};
use crate::error::ManifestError;
use crate::logging::Log;

/// Manifest file name, looked up in every repository root.
pub const FILE_NAME: &str = "dependencies";

/// Reserved key holding per-backend root URLs.
pub const ROOT_KEY: &str = "_root";

/// Reserved key holding the path to the canonical engine binary.
pub const SELF_KEY: &str = "_self";

/// Example manifest shown when the top-level repository has none.
pub const USAGE: &str = "\
A dependencies file should look like this:

  # Backend-specific root URLs for the repositories
  _root = hg:https://hg.example.org/ git:https://github.com/example/
  # Binary to update this tool from (optional)
  _self = buildtools/bin/ensure-deps
  # Clone the elemhidehelper repository into extensions/elemhidehelper at
  # tag \"1.2\".
  extensions/elemhidehelper = elemhidehelper 1.2
  # Clone buildtools into buildtools at backend-specific revision ids.
  buildtools = buildtools hg:016d16f7137b git:f3f8692f82e5
  # Override the source URL for Git and pin backend-specific revisions.
  core = core hg:893426c6a6ab git:git@github.com:user/core.git@b2ffd52b
  # Clone from a specific Git repository only.
  chrome = git:git@github.com:user/chrome.git@1fad3a7
";

/// Parsed manifest: dependency entries in file order plus reserved keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    dependencies: Vec<(String, DependencySpec)>,
    reserved: Vec<(String, ValueSpec)>,
}

impl Manifest {
    /// Read `dir/dependencies`.
    ///
    /// Returns `Ok(None)` if the file does not exist, which is different
    /// from a manifest without entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read(dir: &Path, log: &dyn Log) -> Result<Option<Self>, ManifestError> {
        let path = dir.join(FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(Self::parse(&path, &content, log))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ManifestError::Io { path, source }),
        }
    }

    /// Parse manifest text.  `file` only labels warnings.
    ///
    /// A key declared twice keeps its first position and takes the later
    /// spec.
    #[must_use]
    pub fn parse(file: &Path, content: &str, log: &dyn Log) -> Self {
        let mut manifest = Self::default();
        for raw in content.lines() {
            let line = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(file, line, log) {
                ParsedLine::Dependency { key, spec } => {
                    upsert(&mut manifest.dependencies, key, spec);
                }
                ParsedLine::Reserved { key, spec } => upsert(&mut manifest.reserved, key, spec),
                ParsedLine::Empty { .. } | ParsedLine::Invalid => {}
            }
        }
        manifest
    }

    /// Dependency entries in file order.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &DependencySpec)> {
        self.dependencies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the manifest declares no dependencies.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Value of a reserved key.
    #[must_use]
    pub fn reserved(&self, key: &str) -> Option<&ValueSpec> {
        self.reserved
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The `_root` entry.
    #[must_use]
    pub fn roots(&self) -> Option<&ValueSpec> {
        self.reserved(ROOT_KEY)
    }

    /// Replace the `_root` entry.
    pub fn set_roots(&mut self, roots: ValueSpec) {
        upsert(&mut self.reserved, ROOT_KEY.to_string(), roots);
    }

    /// The wildcard value of `_self`, if declared.
    #[must_use]
    pub fn self_path(&self) -> Option<&str> {
        self.reserved(SELF_KEY)?
            .get(SourceKey::Wildcard)
            .map(String::as_str)
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
}
