//! Parsing of single manifest lines into source specs.
//!
//! A line reads `key = [type:]value [[type:]value ...]`.  For dependency keys
//! each value is further split into `[source@]revision`, except for a
//! leading untyped token which is always a bare source.
use std::fmt;
use std::path::Path;

use crate::logging::Log;
use crate::vcs::VcsKind;

/// Backend a manifest value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    /// Applies to every backend (no `type:` prefix).
    Wildcard,
    /// Applies to one backend only.
    Vcs(VcsKind),
}

impl SourceKey {
    /// Manifest token: `*` for the wildcard, otherwise the backend token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Wildcard => "*",
            Self::Vcs(kind) => kind.token(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A `(source, revision)` pair; either half may be unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Repository name or URL, relative to the backend root.
    pub source: Option<String>,
    /// Revision reference (tag, branch or id).
    pub revision: Option<String>,
}

impl Location {
    /// Create a location from optional parts, treating empty strings as absent.
    #[must_use]
    pub fn new(source: Option<&str>, revision: Option<&str>) -> Self {
        let keep = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            source: keep(source),
            revision: keep(revision),
        }
    }

    /// Element-wise merge: every field `later` specifies wins, the rest
    /// falls back to `earlier`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ensure_deps_cli::config::spec::Location;
    ///
    /// let a = Location::new(None, Some("2"));
    /// let b = Location::new(Some("1"), None);
    /// assert_eq!(Location::merge(Some(&a), Some(&b)), Location::new(Some("1"), Some("2")));
    /// assert_eq!(Location::merge(None, Some(&a)), a);
    /// ```
    #[must_use]
    pub fn merge(earlier: Option<&Self>, later: Option<&Self>) -> Self {
        let pick = |e: Option<&String>, l: Option<&String>| l.or(e).cloned();
        Self {
            source: pick(
                earlier.and_then(|e| e.source.as_ref()),
                later.and_then(|l| l.source.as_ref()),
            ),
            revision: pick(
                earlier.and_then(|e| e.revision.as_ref()),
                later.and_then(|l| l.revision.as_ref()),
            ),
        }
    }

    /// Parse `[source@]revision`, splitting at the last `@` that leaves a
    /// non-empty revision.
    fn parse(value: &str) -> Self {
        let searchable = value.strip_suffix('@').unwrap_or(value);
        match searchable.rfind('@') {
            Some(idx) => {
                let (source, rest) = value.split_at(idx);
                Self::new(Some(source), rest.strip_prefix('@'))
            }
            None => Self::new(None, Some(value)),
        }
    }
}

/// Ordered mapping from [`SourceKey`] to a value, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec<V> {
    entries: Vec<(SourceKey, V)>,
}

/// Spec of a dependency key: backend → location.
pub type DependencySpec = SourceSpec<Location>;

/// Spec of a reserved key such as `_root`: backend → plain value.
pub type ValueSpec = SourceSpec<String>;

impl<V> Default for SourceSpec<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> SourceSpec<V> {
    /// Value stored for `key`.
    #[must_use]
    pub fn get(&self, key: SourceKey) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` has a value.
    #[must_use]
    pub fn contains(&self, key: SourceKey) -> bool {
        self.get(key).is_some()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = SourceKey> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Set `key` to `value`, keeping the key's original position.
    pub fn insert(&mut self, key: SourceKey, value: V) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

impl<V> FromIterator<(SourceKey, V)> for SourceSpec<V> {
    fn from_iter<I: IntoIterator<Item = (SourceKey, V)>>(iter: I) -> Self {
        let mut spec = Self::default();
        for (key, value) in iter {
            spec.insert(key, value);
        }
        spec
    }
}

/// Result of parsing one manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A dependency declaration.
    Dependency {
        /// Relative checkout path.
        key: String,
        /// Per-backend locations.
        spec: DependencySpec,
    },
    /// A reserved (underscore-prefixed) declaration.
    Reserved {
        /// Key including the leading underscore.
        key: String,
        /// Per-backend values.
        spec: ValueSpec,
    },
    /// A key with no value; callers skip it.
    Empty {
        /// The key that had no value.
        key: String,
    },
    /// The line has no `=`.
    Invalid,
}

/// Split `[type:]value`.  Only a known backend token followed by a
/// non-empty value counts as a prefix.
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::config::spec::{SourceKey, split_token};
/// use ensure_deps_cli::vcs::VcsKind;
///
/// assert_eq!(split_token("git:1.0"), (SourceKey::Vcs(VcsKind::Git), "1.0"));
/// assert_eq!(split_token("svn:1.0"), (SourceKey::Wildcard, "svn:1.0"));
/// assert_eq!(split_token("git:"), (SourceKey::Wildcard, "git:"));
/// ```
#[must_use]
pub fn split_token(token: &str) -> (SourceKey, &str) {
    if let Some((prefix, value)) = token.split_once(':')
        && !value.is_empty()
        && let Some(kind) = VcsKind::from_token(prefix)
    {
        return (SourceKey::Vcs(kind), value);
    }
    (SourceKey::Wildcard, token)
}

/// Parse one comment-stripped, non-blank manifest line.
///
/// Warnings go to `log`; `file` only labels them.
#[must_use]
pub fn parse_line(file: &Path, line: &str, log: &dyn Log) -> ParsedLine {
    let Some((key, value)) = line.split_once('=') else {
        log.warn(&format!("Invalid line in file {}: {line}", file.display()));
        return ParsedLine::Invalid;
    };
    let key = key.trim().to_string();
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.is_empty() {
        log.warn(&format!(
            "No value specified for key {key} in file {}",
            file.display()
        ));
        return ParsedLine::Empty { key };
    }

    if key.starts_with('_') {
        let mut spec = ValueSpec::default();
        for token in tokens {
            let (source_key, value) = split_token(token);
            if spec.contains(source_key) {
                log.warn(&format!(
                    "Ignoring duplicate value for type '{source_key}' (key '{key}' in file {})",
                    file.display()
                ));
                continue;
            }
            spec.insert(source_key, value.to_string());
        }
        return ParsedLine::Reserved { key, spec };
    }

    let mut spec = DependencySpec::default();
    for (i, token) in tokens.into_iter().enumerate() {
        let (source_key, value) = split_token(token);
        let location = if i == 0 && source_key == SourceKey::Wildcard {
            Location::new(Some(value), None)
        } else {
            Location::parse(value)
        };
        let merged = Location::merge(spec.get(source_key), Some(&location));
        spec.insert(source_key, merged);
    }
    ParsedLine::Dependency { key, spec }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;

    const HG: SourceKey = SourceKey::Vcs(VcsKind::Mercurial);
    const GIT: SourceKey = SourceKey::Vcs(VcsKind::Git);

    fn parse(line: &str) -> (ParsedLine, MemoryLog) {
        let log = MemoryLog::new();
        let parsed = parse_line(Path::new("dependencies"), line, &log);
        (parsed, log)
    }

    fn dependency(line: &str) -> DependencySpec {
        match parse(line).0 {
            ParsedLine::Dependency { spec, .. } => spec,
            other => panic!("expected a dependency, got {other:?}"),
        }
    }

    fn loc(source: Option<&str>, revision: Option<&str>) -> Location {
        Location::new(source, revision)
    }

    #[test]
    fn merge_is_positional() {
        let none_two = loc(None, Some("2"));
        let one_none = loc(Some("1"), None);
        assert_eq!(
            Location::merge(Some(&none_two), Some(&one_none)),
            loc(Some("1"), Some("2"))
        );
        let both = loc(Some("1"), Some("2"));
        assert_eq!(Location::merge(None, Some(&both)), both);
        assert_eq!(
            Location::merge(Some(&both), Some(&loc(Some("3"), Some("4")))),
            loc(Some("3"), Some("4"))
        );
        assert_eq!(Location::merge(Some(&both), None), both);
    }

    #[test]
    fn first_untyped_token_is_a_bare_source() {
        let spec = dependency("extensions/elemhidehelper = elemhidehelper 1.2");
        assert_eq!(
            spec.get(SourceKey::Wildcard),
            Some(&loc(Some("elemhidehelper"), Some("1.2")))
        );
    }

    #[test]
    fn first_untyped_token_is_not_split_on_at() {
        let spec = dependency("x = git@github.com:user/x.git");
        assert_eq!(
            spec.get(SourceKey::Wildcard),
            Some(&loc(Some("git@github.com:user/x.git"), None))
        );
    }

    #[test]
    fn typed_tokens_carry_revisions() {
        let spec = dependency("buildtools = buildtools hg:016d16f7137b git:f3f8692f82e5");
        assert_eq!(spec.get(HG), Some(&loc(None, Some("016d16f7137b"))));
        assert_eq!(spec.get(GIT), Some(&loc(None, Some("f3f8692f82e5"))));
        assert_eq!(spec.keys().collect::<Vec<_>>(), vec![SourceKey::Wildcard, HG, GIT]);
    }

    #[test]
    fn source_override_splits_at_last_at() {
        let spec = dependency(
            "adblockplus = adblockplus hg:893426c6a6ab git:git@github.com:user/adblockplus.git@b2ffd52b",
        );
        assert_eq!(
            spec.get(GIT),
            Some(&loc(
                Some("git@github.com:user/adblockplus.git"),
                Some("b2ffd52b")
            ))
        );
    }

    #[test]
    fn typed_first_token_is_split() {
        let spec = dependency("adblockpluschrome = git:git@github.com:user/adblockpluschrome.git@1fad3a7");
        assert!(!spec.contains(SourceKey::Wildcard));
        assert_eq!(
            spec.get(GIT),
            Some(&loc(
                Some("git@github.com:user/adblockpluschrome.git"),
                Some("1fad3a7")
            ))
        );
    }

    #[test]
    fn trailing_at_is_part_of_the_revision() {
        assert_eq!(Location::parse("a@"), loc(None, Some("a@")));
        assert_eq!(Location::parse("a@@"), loc(Some("a"), Some("@")));
        assert_eq!(Location::parse("@rev"), loc(None, Some("rev")));
        assert_eq!(Location::parse("a@b@c"), loc(Some("a@b"), Some("c")));
    }

    #[test]
    fn later_wildcard_tokens_are_split_and_merged() {
        let spec = dependency("core = core 1.0 other@2.0");
        assert_eq!(
            spec.get(SourceKey::Wildcard),
            Some(&loc(Some("other"), Some("2.0")))
        );
    }

    #[test]
    fn duplicate_dependency_tokens_merge_without_warning() {
        let (parsed, log) = parse("core = core hg:1.0 hg:src@");
        let ParsedLine::Dependency { spec, .. } = parsed else {
            panic!("expected a dependency");
        };
        assert_eq!(spec.get(HG), Some(&loc(None, Some("src@"))));
        assert!(log.warnings().is_empty());

        let spec = dependency("core = core hg:src@1.0 hg:2.0");
        assert_eq!(spec.get(HG), Some(&loc(Some("src"), Some("2.0"))));
    }

    #[test]
    fn duplicate_reserved_token_keeps_first_and_warns() {
        let (parsed, log) = parse("_root = hg:https://a/ hg:https://b/ git:https://c/");
        let ParsedLine::Reserved { key, spec } = parsed else {
            panic!("expected a reserved key");
        };
        assert_eq!(key, "_root");
        assert_eq!(spec.get(HG).map(String::as_str), Some("https://a/"));
        assert_eq!(spec.get(GIT).map(String::as_str), Some("https://c/"));
        assert_eq!(log.warnings().len(), 1);
        assert!(log.warnings()[0].contains("duplicate value for type 'hg'"));
    }

    #[test]
    fn reserved_values_are_not_split() {
        let (parsed, _) = parse("_self = buildtools/ensure-deps@1");
        let ParsedLine::Reserved { spec, .. } = parsed else {
            panic!("expected a reserved key");
        };
        assert_eq!(
            spec.get(SourceKey::Wildcard).map(String::as_str),
            Some("buildtools/ensure-deps@1")
        );
    }

    #[test]
    fn missing_equals_is_invalid() {
        let (parsed, log) = parse("just some words");
        assert_eq!(parsed, ParsedLine::Invalid);
        assert_eq!(
            log.warnings(),
            vec!["Invalid line in file dependencies: just some words"]
        );
    }

    #[test]
    fn empty_value_yields_key_only() {
        let (parsed, log) = parse("core =   ");
        assert_eq!(parsed, ParsedLine::Empty { key: "core".into() });
        assert_eq!(
            log.warnings(),
            vec!["No value specified for key core in file dependencies"]
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let spec = dependency("q = src rev=1");
        assert_eq!(spec.get(SourceKey::Wildcard), Some(&loc(Some("src"), Some("rev=1"))));
    }

    #[test]
    fn bare_prefix_is_a_wildcard_value() {
        let spec = dependency("core = core git:");
        assert_eq!(
            spec.get(SourceKey::Wildcard),
            Some(&loc(Some("core"), Some("git:")))
        );
        assert!(!spec.contains(GIT));
    }
}
