//! go.mod reader
//!
//! Extracts `require` directives from go.mod files.
//! Supports both single-line require directives and require blocks.
//!
//! Format examples:
//! - Single: `require golang.org/x/text v0.14.0`
//! - Block:
//!   ```text
//!   require (
//!       golang.org/x/text v0.14.0
//!       golang.org/x/net v0.20.0 // indirect
//!   )
//!   ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::MANIFEST_FILE;

/// Match: require module/path v1.2.3 [// comment]
static SINGLE_REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^require\s+(\S+)\s+(v[^\s/]+)\s*(//.*)?$").expect("valid regex")
});

/// Match: require (
static BLOCK_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^require\s*\(\s*(//.*)?$").expect("valid regex"));

/// Match: module/path v1.2.3 [// comment]
static REQUIRE_SPEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(v[^\s/]+)\s*(//.*)?$").expect("valid regex"));

/// Match: // indirect [; other comment]
static INDIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//\s*indirect\s*(;|$)").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no go.mod found in {} or any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single `require` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

/// Parse the require entries of a go.mod file
pub fn parse_requires(content: &str) -> Vec<Dependency> {
    let mut results = Vec::new();
    let mut in_require_block = false;
    let mut in_other_block = false;

    for line in content.lines() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if trimmed == ")" {
            in_require_block = false;
            in_other_block = false;
            continue;
        }

        if in_other_block {
            continue;
        }

        if BLOCK_START_RE.is_match(trimmed) {
            in_require_block = true;
            continue;
        }

        // replace/exclude/retract blocks
        if trimmed.ends_with('(') {
            in_other_block = true;
            continue;
        }

        let caps = if in_require_block {
            REQUIRE_SPEC_RE.captures(trimmed)
        } else {
            SINGLE_REQUIRE_RE.captures(trimmed)
        };

        if let Some(caps) = caps {
            let indirect = caps
                .get(3)
                .is_some_and(|comment| INDIRECT_RE.is_match(comment.as_str()));
            results.push(Dependency {
                path: unquote_path(&caps[1]),
                version: caps[2].to_string(),
                indirect,
            });
        }
    }

    results
}

fn unquote_path(path: &str) -> String {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
        .to_string()
}

/// Search `dir` and its parents for a go.mod file
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let start = std::path::absolute(dir).map_err(|source| ManifestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for candidate in start.ancestors() {
        let path = candidate.join(MANIFEST_FILE);
        match path.try_exists() {
            Ok(true) => return Ok(path),
            Ok(false) => {}
            Err(source) => return Err(ManifestError::Io { path, source }),
        }
    }

    Err(ManifestError::NotFound(start))
}

/// Direct (non-indirect) dependencies of the module containing `dir`
pub fn direct_dependencies(dir: &Path) -> Result<Vec<Dependency>, ManifestError> {
    let path = find_manifest(dir)?;
    let content = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;

    let direct: Vec<_> = parse_requires(&content)
        .into_iter()
        .filter(|dep| !dep.indirect)
        .collect();
    debug!("{} direct dependencies in {}", direct.len(), path.display());

    Ok(direct)
}
