//! Module version listing returned by the proxy

use crate::module::path::{join_path, module_prefix};
use crate::module::version;

/// A module path and the versions the proxy lists for it.
///
/// Versions come in whatever order the proxy returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub versions: Vec<String>,
}

impl Module {
    pub fn new(path: impl Into<String>, versions: Vec<String>) -> Self {
        Self {
            path: path.into(),
            versions,
        }
    }

    /// Returns the highest valid version starting with `prefix`.
    ///
    /// An empty prefix accepts every version. If `stable` is true,
    /// prerelease versions are excluded.
    pub fn max_version(&self, prefix: &str, stable: bool) -> Option<String> {
        self.versions
            .iter()
            .filter(|v| version::is_valid(v) && v.starts_with(prefix))
            .filter(|v| !stable || version::prerelease(v).is_empty())
            .max_by(|a, b| version::compare(a, b))
            .cloned()
    }

    /// Path of this module at the given version
    pub fn version_path(&self, version: &str) -> String {
        join_path(module_prefix(&self.path), version, "")
    }

    /// Path at which the next major version would be published.
    ///
    /// Returns `None` when there is no stable release, the latest stable
    /// release is v0 (v0 and v1 share the unsuffixed path), or its major
    /// has no successor.
    pub fn next_major_path(&self) -> Option<String> {
        let latest = self.max_version("", true)?;
        let current = version::parse(&latest)?;
        if current.major == 0 {
            return None;
        }
        let next = current.major.checked_add(1)?;
        Some(self.version_path(&format!("v{}", next)))
    }
}
