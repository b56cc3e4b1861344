//! Dependency upgrade orchestration
//!
//! An upgrade pins the new version through the package manager. When the
//! new version crosses into a suffixed major (v2+), imports of the module
//! are rewritten to the new path and the manifest is tidied.
//!
//! # Modules
//!
//! - [`package_manager`]: `PackageManager` trait and the `go` command backend
//! - [`error`]: Error types

pub mod error;
pub mod package_manager;

use std::path::Path;

use tracing::info;

use crate::module::path::{join_path, split_path};
use crate::module::version;
use crate::rewrite::{ImportAction, ImportReference, rewrite_tree};
use crate::rewrite::error::RewriteError;
use crate::upgrade::error::UpgradeError;
use crate::upgrade::package_manager::PackageManager;

/// Outcome of a single upgrade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Number of source files whose imports were rewritten
    pub rewritten_files: usize,
    /// Whether the manifest was tidied
    pub tidied: bool,
}

/// Options controlling the steps after `go get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeOptions {
    pub rewrite: bool,
    pub tidy: bool,
}

/// Returns true if moving to `new_version` requires rewriting import paths
pub fn needs_rewrite(new_version: &str) -> Result<bool, UpgradeError> {
    let major = version::major(new_version);
    if major.is_empty() {
        return Err(UpgradeError::InvalidVersion(new_version.to_string()));
    }
    Ok(major != "v0" && major != "v1" && !version::is_incompatible(new_version))
}

/// Replace policy moving imports of `module_prefix` to `new_version`.
///
/// Imports outside the module are skipped. Package directories are kept.
pub fn major_upgrade_policy(
    module_prefix: &str,
    new_version: &str,
) -> impl FnMut(&ImportReference) -> Result<ImportAction, RewriteError> + Send + 'static {
    let module_prefix = module_prefix.to_string();
    let new_version = new_version.to_string();

    move |reference: &ImportReference| match split_path(&module_prefix, &reference.path) {
        Some((_, subdir)) => Ok(ImportAction::Replace(join_path(
            &module_prefix,
            &new_version,
            &subdir,
        ))),
        None => Ok(ImportAction::Skip),
    }
}

/// Upgrades `module_prefix` to `new_version` in the module rooted at `dir`.
pub async fn upgrade(
    package_manager: &dyn PackageManager,
    module_prefix: &str,
    new_version: &str,
    dir: &Path,
    options: UpgradeOptions,
) -> Result<UpgradeReport, UpgradeError> {
    let new_path = join_path(module_prefix, new_version, "");
    package_manager.get(&new_path, new_version).await?;
    info!("Pinned {}@{}", new_path, new_version);

    let mut report = UpgradeReport::default();
    if !options.rewrite || !needs_rewrite(new_version)? {
        return Ok(report);
    }

    let policy = major_upgrade_policy(module_prefix, new_version);
    let root = dir.to_path_buf();
    report.rewritten_files =
        tokio::task::spawn_blocking(move || rewrite_tree(&root, policy)).await??;

    if options.tidy {
        package_manager.tidy().await?;
        report.tidied = true;
    }

    Ok(report)
}
