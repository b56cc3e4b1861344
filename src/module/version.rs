//! Go module version utilities
//!
//! Go versions are semantic versions with a mandatory `v` prefix:
//! - Standard semver: v1.2.3, v1.2.3-rc.1
//! - Shorthand: v1, v1.2 (treated as v1.0.0, v1.2.0)
//! - +incompatible suffix: v2.0.0+incompatible (pre-go.mod v2+ modules)
//! - Pseudo-versions: v0.0.0-20210101000000-abcdef123456

use std::cmp::Ordering;

use semver::{BuildMetadata, Version};

/// Build metadata marking a v2+ release published without a `/vN` path suffix
pub const INCOMPATIBLE: &str = "+incompatible";

/// Parse a Go version into a semver::Version.
///
/// Shorthand versions (`v1`, `v1.2`) are padded with zeros. They may not
/// carry prerelease or build suffixes.
pub fn parse(version: &str) -> Option<Version> {
    let version = version.strip_prefix('v')?;
    let has_suffix = version.contains(['-', '+']);
    let normalized = match version.split('.').count() {
        1 if !has_suffix => format!("{}.0.0", version),
        2 if !has_suffix => format!("{}.0", version),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Returns true if `version` is a valid Go version
pub fn is_valid(version: &str) -> bool {
    parse(version).is_some()
}

/// Returns the major prefix (`v2`) of a version, or an empty string if the
/// version is invalid.
pub fn major(version: &str) -> String {
    parse(version)
        .map(|v| format!("v{}", v.major))
        .unwrap_or_default()
}

/// Returns the prerelease part including its leading dash (`-rc.1`), or an
/// empty string.
pub fn prerelease(version: &str) -> &str {
    if !is_valid(version) {
        return "";
    }
    let core = strip_build(version);
    core.find('-').map(|idx| &core[idx..]).unwrap_or("")
}

/// Returns the build metadata including its leading plus (`+incompatible`),
/// or an empty string.
pub fn build(version: &str) -> &str {
    if !is_valid(version) {
        return "";
    }
    version.find('+').map(|idx| &version[idx..]).unwrap_or("")
}

/// Returns the version without its build metadata
pub fn strip_build(version: &str) -> &str {
    version
        .find('+')
        .map(|idx| &version[..idx])
        .unwrap_or(version)
}

/// Returns true if the version carries the `+incompatible` marker
pub fn is_incompatible(version: &str) -> bool {
    build(version) == INCOMPATIBLE
}

/// Compare two versions by semver precedence.
///
/// Build metadata is ignored. An invalid version sorts before every valid
/// one, and two invalid versions are equal.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(mut a), Some(mut b)) => {
            a.build = BuildMetadata::EMPTY;
            b.build = BuildMetadata::EMPTY;
            a.cmp(&b)
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Returns true if the two versions differ in precedence
pub fn diff(old: &str, new: &str) -> bool {
    compare(old, new) != Ordering::Equal
}

/// Check if a version is a pseudo-version.
///
/// Pseudo-version formats:
/// - v0.0.0-YYYYMMDDHHMMSS-commit (no base version)
/// - vX.Y.Z-0.YYYYMMDDHHMMSS-commit (with base version)
/// - vX.Y.Z-pre.0.YYYYMMDDHHMMSS-commit (prerelease base version)
pub fn is_pseudo_version(version: &str) -> bool {
    let pre = prerelease(version);
    let Some(rest) = pre.strip_prefix('-') else {
        return false;
    };

    let Some((head, commit)) = rest.rsplit_once('-') else {
        return false;
    };
    if commit.is_empty() || !commit.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let timestamp = head.rsplit('.').next().unwrap_or(head);
    timestamp.len() == 14 && timestamp.chars().all(|c| c.is_ascii_digit())
}

/// Returns true for a pseudo-version without a tagged base
/// (`v0.0.0-YYYYMMDDHHMMSS-commit`).
pub fn is_untagged_pseudo_version(version: &str) -> bool {
    version.starts_with("v0.0.0-") && is_pseudo_version(version)
}

/// Which components changed between two versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionDiff {
    pub major: bool,
    pub minor: bool,
    pub patch: bool,
    pub prerelease: bool,
}

impl VersionDiff {
    /// Compute the component-wise difference between `old` and `new`.
    ///
    /// Returns `None` if either version is invalid.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        let old = parse(old)?;
        let new = parse(new)?;
        Some(Self {
            major: old.major != new.major,
            minor: old.minor != new.minor,
            patch: old.patch != new.patch,
            prerelease: old.pre != new.pre,
        })
    }

    /// Returns true if the major version changed
    pub fn is_breaking(&self) -> bool {
        self.major
    }
}
