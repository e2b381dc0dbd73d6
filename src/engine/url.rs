//! Clone URL construction.
//!
//! A dependency names its source relative to a per-backend root.  Roots that
//! exist on disk are joined as filesystem paths; anything else is treated as
//! a URL and resolved with RFC 3986 reference resolution.
use std::borrow::Cow;
use std::path::Path;

/// Scheme of `url`, if it starts with one (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`).
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::engine::url::scheme_of;
///
/// assert_eq!(scheme_of("https://hg.example.org/"), Some("https"));
/// assert_eq!(scheme_of("git@github.com:user/repo.git"), None);
/// ```
#[must_use]
pub fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(scheme)
}

/// Full clone location for `source` under `root`.
///
/// Both inputs must already be normalized by the backend.  An empty root
/// leaves `source` untouched.
#[must_use]
pub fn clone_url(root: &str, source: &str) -> String {
    if !root.is_empty() && Path::new(root).exists() {
        return Path::new(root).join(source).to_string_lossy().into_owned();
    }
    join(root, source)
}

/// Resolve `reference` against `base` (RFC 3986, section 5.2).
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::engine::url::join;
///
/// assert_eq!(join("https://hg.example.org/", "core"), "https://hg.example.org/core");
/// assert_eq!(join("https://example.org/a/b", "../c"), "https://example.org/c");
/// assert_eq!(join("", "core"), "core");
/// ```
#[must_use]
pub fn join(base: &str, reference: &str) -> String {
    if base.is_empty() {
        return reference.to_string();
    }
    if reference.is_empty() {
        return base.to_string();
    }

    let b = Parts::parse(base);
    let r = Parts::parse(reference);

    let target = if r.scheme.is_some() {
        Parts {
            path: Cow::Owned(remove_dot_segments(&r.path)),
            ..r
        }
    } else if r.authority.is_some() {
        Parts {
            scheme: b.scheme,
            path: Cow::Owned(remove_dot_segments(&r.path)),
            ..r
        }
    } else if r.path.is_empty() {
        Parts {
            query: r.query.or(b.query),
            fragment: r.fragment,
            ..b
        }
    } else {
        let path = if r.path.starts_with('/') {
            remove_dot_segments(&r.path)
        } else {
            remove_dot_segments(&merge_paths(&b, &r.path))
        };
        Parts {
            path: Cow::Owned(path),
            query: r.query,
            fragment: r.fragment,
            ..b
        }
    };
    target.compose()
}

/// Remove `.` and `..` segments from a URL path (RFC 3986, section 5.2.4).
#[must_use]
pub fn remove_dot_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/')
        || path.ends_with("/.")
        || path.ends_with("/..")
        || path == "."
        || path == "..";

    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }

    let mut result = String::new();
    if absolute {
        result.push('/');
    }
    result.push_str(&out.join("/"));
    if trailing && !out.is_empty() {
        result.push('/');
    }
    result
}

/// Merge a relative reference path with the base path (RFC 3986, section 5.2.3).
fn merge_paths(base: &Parts<'_>, reference: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        return format!("/{reference}");
    }
    match base.path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{reference}"),
        None => reference.to_string(),
    }
}

#[derive(Debug)]
struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: Cow<'a, str>,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Parts<'a> {
    fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        let (scheme, rest) = match rest.split_once(':') {
            Some((scheme, after)) if scheme_of(rest).is_some() => (Some(scheme), after),
            _ => (None, rest),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let (authority, path) = after.split_at(after.find('/').unwrap_or(after.len()));
                (Some(authority), path)
            }
            None => (None, rest),
        };
        Self {
            scheme,
            authority,
            path: Cow::Borrowed(path),
            query,
            fragment,
        }
    }

    fn compose(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}
