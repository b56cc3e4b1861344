//! Module path codec
//!
//! Go module paths carry their major version in the path itself once the
//! major reaches v2 (semantic import versioning):
//! - `github.com/google/go-cmp` (v0/v1)
//! - `github.com/google/go-cmp/v2` (v2+)
//! - `gopkg.in/yaml.v2` (gopkg.in always uses a dotted `.vN` suffix)
//!
//! Legacy v2+ releases published without a `/vN` suffix carry the
//! `+incompatible` build marker and live at the unsuffixed path.

use crate::module::error::PathError;
use crate::module::version;

/// Host that uses the dotted `.vN` major convention
const GOPKG_IN: &str = "gopkg.in/";

/// Splits a module path into its prefix and its major-version suffix.
///
/// The suffix keeps its separator (`/v2`, `.v2`). A path without a major
/// suffix returns an empty suffix. Returns `None` when the path ends in a
/// malformed major segment (`/v1`, `/v02`, `/v2.1`) or is a `gopkg.in`
/// path without a `.vN` suffix.
pub fn split_path_version(path: &str) -> Option<(&str, &str)> {
    if path.starts_with(GOPKG_IN) {
        return split_gopkg_in(path);
    }

    let bytes = path.as_bytes();
    let mut i = bytes.len();
    let mut dot = false;
    while i > 0 && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.') {
        if bytes[i - 1] == b'.' {
            dot = true;
        }
        i -= 1;
    }

    if i <= 1 || i == bytes.len() || bytes[i - 1] != b'v' || bytes[i - 2] != b'/' {
        return Some((path, ""));
    }

    let (prefix, major) = path.split_at(i - 2);
    if dot || major.len() <= 2 || major.as_bytes()[2] == b'0' || major == "/v1" {
        return None;
    }

    Some((prefix, major))
}

fn split_gopkg_in(path: &str) -> Option<(&str, &str)> {
    let bytes = path.as_bytes();
    let mut i = path.strip_suffix("-unstable").unwrap_or(path).len();
    while i > 0 && bytes[i - 1].is_ascii_digit() {
        i -= 1;
    }

    if i <= 1 || bytes[i - 1] != b'v' || bytes[i - 2] != b'.' {
        return None;
    }

    let (prefix, major) = path.split_at(i - 2);
    if major.len() <= 2 || (major.as_bytes()[2] == b'0' && major != ".v0") {
        return None;
    }

    Some((prefix, major))
}

/// Returns the module path with any trailing major segment stripped.
///
/// The prefix is the identity of a module across major versions.
/// Paths that cannot be split are returned unchanged.
pub fn module_prefix(path: &str) -> &str {
    split_path_version(path)
        .map(|(prefix, _)| prefix)
        .unwrap_or(path)
}

/// Returns the major version carried by the path (`v2` for `.../v2` or
/// `gopkg.in/x.v2`).
///
/// `Some("")` means the path is well formed but has no major segment,
/// `None` means the trailing segment could not be interpreted.
pub fn major_of(path: &str) -> Option<&str> {
    let (_, major) = split_path_version(path)?;
    Some(
        major
            .strip_prefix('/')
            .or_else(|| major.strip_prefix('.'))
            .unwrap_or(major),
    )
}

/// Builds the full import path for `prefix` at `version`, followed by `subdir`.
///
/// `version` may be a full version (`v2.3.0`) or a bare major (`v2`).
/// gopkg.in paths always get a dotted `.vN` suffix. Other paths get `/vN`
/// only for v2+ releases that are not `+incompatible`.
pub fn join_path(prefix: &str, version: &str, subdir: &str) -> String {
    let version = version.strip_prefix('.').unwrap_or(version);
    let version = version.strip_prefix('/').unwrap_or(version);
    let major = version::major(version);

    let mut path = prefix.to_string();
    if prefix.starts_with(GOPKG_IN) {
        if !major.is_empty() {
            path.push('.');
            path.push_str(&major);
        }
    } else if !major.is_empty()
        && major != "v0"
        && major != "v1"
        && !version.contains(version::INCOMPATIBLE)
    {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&major);
    }

    if !subdir.is_empty() {
        path.push('/');
        path.push_str(subdir);
    }

    path
}

/// Splits an import path into the owning module path (including any major
/// suffix) and the package directory inside that module.
///
/// Returns `None` when `full_path` does not belong to `prefix`.
pub fn split_path(prefix: &str, full_path: &str) -> Option<(String, String)> {
    let rest = full_path.strip_prefix(prefix)?;
    let on_boundary = rest.is_empty()
        || rest.starts_with('/')
        || (rest.starts_with('.') && prefix.starts_with(GOPKG_IN));
    if !on_boundary {
        return None;
    }

    let mut module_len = prefix.len();
    if rest.starts_with('/') {
        module_len += 1;
    }
    module_len = match full_path[module_len..].find('/') {
        Some(idx) => module_len + idx,
        None => full_path.len(),
    };

    let candidate = &full_path[..module_len];
    let module_path = match major_of(candidate) {
        Some(major) if !major.is_empty() => candidate.to_string(),
        _ => prefix.to_string(),
    };
    let subdir = full_path[module_path.len()..].trim_start_matches('/');

    Some((module_path, subdir.to_string()))
}

/// Checks that `path` is a syntactically valid module path.
pub fn check_path(path: &str) -> Result<(), PathError> {
    let invalid = |reason: &str| PathError::Invalid {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("empty string"));
    }
    if path.starts_with('/') {
        return Err(invalid("leading slash"));
    }
    if path.ends_with('/') {
        return Err(invalid("trailing slash"));
    }
    if path.contains("//") {
        return Err(invalid("double slash"));
    }

    for (i, elem) in path.split('/').enumerate() {
        check_element(elem).map_err(|reason| invalid(&reason))?;
        if i == 0 {
            check_first_element(elem).map_err(|reason| invalid(&reason))?;
        }
    }

    if split_path_version(path).is_none() {
        return Err(invalid("invalid version suffix"));
    }

    Ok(())
}

fn check_element(elem: &str) -> Result<(), String> {
    if elem.is_empty() {
        return Err("empty path element".to_string());
    }
    if elem == "." || elem == ".." {
        return Err(format!("invalid path element {:?}", elem));
    }
    if elem.starts_with('.') {
        return Err(format!("leading dot in path element {:?}", elem));
    }
    if elem.ends_with('.') {
        return Err(format!("trailing dot in path element {:?}", elem));
    }
    if let Some(c) = elem
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
    {
        return Err(format!("invalid char {:?}", c));
    }
    Ok(())
}

fn check_first_element(elem: &str) -> Result<(), String> {
    if !elem.contains('.') {
        return Err(format!("missing dot in first path element {:?}", elem));
    }
    if elem.starts_with('-') {
        return Err(format!("leading dash in first path element {:?}", elem));
    }
    if let Some(c) = elem
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.')))
    {
        return Err(format!("invalid char {:?} in first path element", c));
    }
    Ok(())
}

/// Escapes a module path for use in proxy URLs.
///
/// Uppercase letters are escaped as `!{lowercase}`, so that module paths
/// stay unique on case-insensitive file systems.
pub fn escape_path(path: &str) -> Result<String, PathError> {
    check_path(path)?;

    let mut result = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            result.push('!');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    Ok(result)
}
