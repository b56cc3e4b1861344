//! Update check for the direct dependencies of a module
//!
//! Every dependency is resolved concurrently and reported in input order.
//! Dependencies pinned to an untagged pseudo-version (`v0.0.0-...`) have no
//! tagged releases to walk, so they share a single `go list -u` listing
//! instead.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::manifest::Dependency;
use crate::module::error::{ProxyError, ResolveError};
use crate::module::path::{join_path, module_prefix};
use crate::module::proxy::ModuleProxy;
use crate::module::resolver::resolve_latest;
use crate::module::version::{self, VersionDiff};
use crate::upgrade::package_manager::PackageManager;

/// Match: module/path: [v0.0.0-...] [v0.0.0-...]
static UPDATE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+): \[(\S+)\] \[(\S+)\]$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("failed to list updates: {0}")]
    Listing(String),
}

/// Options controlling how the latest version is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Skip prerelease versions
    pub stable: bool,
    /// Only ask the proxy for cached versions
    pub cached: bool,
    /// Stay within the current major version
    pub safe: bool,
}

/// A dependency with a newer release available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpgrade {
    /// Module prefix without a major suffix
    pub path: String,
    pub old: String,
    pub new: String,
}

impl ResolvedUpgrade {
    /// Components that changed between the old and new versions
    pub fn diff(&self) -> Option<VersionDiff> {
        VersionDiff::between(&self.old, &self.new)
    }

    /// Old version without build metadata
    pub fn old_version(&self) -> &str {
        version::strip_build(&self.old)
    }

    /// Module path the new version is published under
    pub fn new_path(&self) -> String {
        join_path(&self.path, &self.new, "")
    }
}

/// Result of checking a single dependency
#[derive(Debug)]
pub struct DependencyCheck {
    pub dependency: Dependency,
    /// `Ok(None)` when the dependency is already up to date
    pub outcome: Result<Option<ResolvedUpgrade>, CheckError>,
}

type UpdateListing = Result<Arc<HashMap<String, String>>, String>;

/// Parse `path: [current] [update]` lines into a map of path to update
pub fn parse_update_listing(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| UPDATE_LINE_RE.captures(line.trim()))
        .map(|caps| (caps[1].to_string(), caps[3].to_string()))
        .collect()
}

/// Checks every dependency for a newer release.
///
/// Results are in the same order as `dependencies`. A failure is attributed
/// to its dependency and does not affect the others.
pub async fn check_updates(
    proxy: &dyn ModuleProxy,
    package_manager: &dyn PackageManager,
    dependencies: Vec<Dependency>,
    options: CheckOptions,
) -> Vec<DependencyCheck> {
    // Polled only by untagged pseudo-version dependencies, at most once
    let listing: Shared<BoxFuture<'_, UpdateListing>> = async move {
        package_manager
            .list_updates()
            .await
            .map(|output| Arc::new(parse_update_listing(&output)))
            .map_err(|e| e.to_string())
    }
    .boxed()
    .shared();

    let futures = dependencies.into_iter().map(|dependency| {
        let listing = listing.clone();
        async move {
            let outcome = check_dependency(proxy, &dependency, options, listing).await;
            match &outcome {
                Ok(Some(upgrade)) => debug!(
                    "{}: {} -> {}",
                    dependency.path, upgrade.old, upgrade.new
                ),
                Ok(None) => debug!("{}: up to date", dependency.path),
                Err(e) => warn!("Failed to check {}: {}", dependency.path, e),
            }
            DependencyCheck {
                dependency,
                outcome,
            }
        }
    });

    join_all(futures).await
}

async fn check_dependency(
    proxy: &dyn ModuleProxy,
    dependency: &Dependency,
    options: CheckOptions,
    listing: Shared<BoxFuture<'_, UpdateListing>>,
) -> Result<Option<ResolvedUpgrade>, CheckError> {
    let latest = if version::is_untagged_pseudo_version(&dependency.version) {
        let updates = listing.await.map_err(CheckError::Listing)?;
        updates.get(&dependency.path).cloned()
    } else if options.safe {
        let module = proxy
            .query(&dependency.path, options.cached)
            .await?
            .ok_or_else(|| ResolveError::NotFound(dependency.path.clone()))?;
        let prefix = format!("{}.", version::major(&dependency.version));
        module.max_version(&prefix, options.stable)
    } else {
        resolve_latest(proxy, &dependency.path, options.cached)
            .await?
            .max_version("", options.stable)
    };

    Ok(latest
        .filter(|new| version::compare(new, &dependency.version) == Ordering::Greater)
        .map(|new| ResolvedUpgrade {
            path: module_prefix(&dependency.path).to_string(),
            old: dependency.version.clone(),
            new,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::proxy::MockModuleProxy;
    use crate::module::types::Module;
    use crate::upgrade::error::CommandError;
    use crate::upgrade::package_manager::MockPackageManager;
    use rstest::rstest;

    const NORMAL: CheckOptions = CheckOptions {
        stable: true,
        cached: false,
        safe: false,
    };

    fn dep(path: &str, version: &str) -> Dependency {
        Dependency {
            path: path.to_string(),
            version: version.to_string(),
            indirect: false,
        }
    }

    fn module(path: &str, versions: &[&str]) -> Module {
        Module::new(path, versions.iter().map(|v| v.to_string()).collect())
    }

    fn unused_package_manager() -> MockPackageManager {
        let mut pm = MockPackageManager::new();
        pm.expect_list_updates().times(0);
        pm
    }

    fn upgrade(path: &str, old: &str, new: &str) -> ResolvedUpgrade {
        ResolvedUpgrade {
            path: path.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    #[tokio::test]
    async fn check_updates_reports_major_upgrade() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod")
            .returning(|p, _| Ok(Some(module(p, &["v1.0.0", "v1.2.0"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod/v2")
            .returning(|p, _| Ok(Some(module(p, &["v2.0.0"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod/v3")
            .returning(|_, _| Ok(None));
        let pm = unused_package_manager();

        let results =
            check_updates(&proxy, &pm, vec![dep("example.com/mod", "v1.2.0")], NORMAL).await;

        assert_eq!(results.len(), 1);
        let resolved = results[0].outcome.as_ref().unwrap().clone().unwrap();
        assert_eq!(resolved, upgrade("example.com/mod", "v1.2.0", "v2.0.0"));
        assert_eq!(resolved.new_path(), "example.com/mod/v2");
        assert!(resolved.diff().unwrap().is_breaking());
    }

    #[tokio::test]
    async fn check_updates_excludes_dependency_without_newer_version() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/legacy")
            .returning(|p, _| Ok(Some(module(p, &["v1.0.0", "v2.5.0+incompatible"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/legacy/v3" || p == "example.com/legacy/v2")
            .returning(|_, _| Ok(None));
        let pm = unused_package_manager();

        let results = check_updates(
            &proxy,
            &pm,
            vec![dep("example.com/legacy", "v2.5.0+incompatible")],
            NORMAL,
        )
        .await;

        assert!(matches!(results[0].outcome, Ok(None)));
    }

    #[tokio::test]
    async fn check_updates_never_reports_downgrade() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod")
            .returning(|p, _| Ok(Some(module(p, &["v1.0.0", "v1.1.0"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod/v2")
            .returning(|_, _| Ok(None));
        let pm = unused_package_manager();

        let results =
            check_updates(&proxy, &pm, vec![dep("example.com/mod", "v1.2.0-rc.1")], NORMAL).await;

        assert!(matches!(results[0].outcome, Ok(None)));
    }

    #[tokio::test]
    async fn check_updates_keeps_input_order_and_isolates_failures() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/a")
            .returning(|p, _| Ok(Some(module(p, &["v0.1.0", "v0.2.0"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/broken")
            .returning(|_, _| Err(ProxyError::Registry("bad gateway".to_string())));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/missing")
            .returning(|_, _| Ok(None));
        let pm = unused_package_manager();

        let results = check_updates(
            &proxy,
            &pm,
            vec![
                dep("example.com/a", "v0.1.0"),
                dep("example.com/broken", "v1.0.0"),
                dep("example.com/missing", "v1.0.0"),
            ],
            NORMAL,
        )
        .await;

        let paths: Vec<_> = results.iter().map(|r| r.dependency.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["example.com/a", "example.com/broken", "example.com/missing"]
        );
        assert_eq!(
            results[0].outcome.as_ref().unwrap(),
            &Some(upgrade("example.com/a", "v0.1.0", "v0.2.0"))
        );
        assert!(matches!(
            &results[1].outcome,
            Err(CheckError::Resolve(ResolveError::Proxy(_)))
        ));
        assert_eq!(
            results[2].outcome.as_ref().unwrap_err().to_string(),
            "module not found: example.com/missing"
        );
    }

    #[tokio::test]
    async fn check_updates_in_safe_mode_stays_within_major() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, cached| p == "example.com/mod" && *cached)
            .times(1)
            .returning(|p, _| {
                Ok(Some(module(
                    p,
                    &["v1.2.0", "v1.3.0", "v1.4.0-rc.1", "v10.0.0+incompatible"],
                )))
            });
        let pm = unused_package_manager();

        let options = CheckOptions {
            stable: true,
            cached: true,
            safe: true,
        };
        let results =
            check_updates(&proxy, &pm, vec![dep("example.com/mod", "v1.2.0")], options).await;

        let resolved = results[0].outcome.as_ref().unwrap().clone().unwrap();
        assert_eq!(resolved, upgrade("example.com/mod", "v1.2.0", "v1.3.0"));
        assert!(!resolved.diff().unwrap().is_breaking());
    }

    #[tokio::test]
    async fn check_updates_in_unstable_mode_accepts_prerelease() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .returning(|p, _| Ok(Some(module(p, &["v1.2.0", "v1.4.0-rc.1"]))));
        let pm = unused_package_manager();

        let options = CheckOptions {
            stable: false,
            cached: false,
            safe: true,
        };
        let results =
            check_updates(&proxy, &pm, vec![dep("example.com/mod", "v1.2.0")], options).await;

        assert_eq!(
            results[0].outcome.as_ref().unwrap(),
            &Some(upgrade("example.com/mod", "v1.2.0", "v1.4.0-rc.1"))
        );
    }

    #[tokio::test]
    async fn check_updates_lists_pseudo_versions_once() {
        let mut proxy = MockModuleProxy::new();
        proxy.expect_query().times(0);
        let mut pm = MockPackageManager::new();
        pm.expect_list_updates().times(1).returning(|| {
            Ok(concat!(
                "example.com/a: [v0.0.0-20210101000000-abcdef123456] [v0.0.0-20220101000000-123456abcdef]\n",
                "example.com/b: [v0.0.0-20210101000000-abcdef123456] [v0.0.0-20200101000000-fedcba654321]\n",
            )
            .to_string())
        });

        let results = check_updates(
            &proxy,
            &pm,
            vec![
                dep("example.com/a", "v0.0.0-20210101000000-abcdef123456"),
                dep("example.com/b", "v0.0.0-20210101000000-abcdef123456"),
                dep("example.com/c", "v0.0.0-20210101000000-abcdef123456"),
            ],
            NORMAL,
        )
        .await;

        assert_eq!(
            results[0].outcome.as_ref().unwrap(),
            &Some(upgrade(
                "example.com/a",
                "v0.0.0-20210101000000-abcdef123456",
                "v0.0.0-20220101000000-123456abcdef"
            ))
        );
        assert!(matches!(results[1].outcome, Ok(None)));
        assert!(matches!(results[2].outcome, Ok(None)));
    }

    #[tokio::test]
    async fn check_updates_walks_majors_for_tagged_pseudo_version() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod")
            .returning(|p, _| Ok(Some(module(p, &["v1.1.2"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod/v2")
            .returning(|p, _| Ok(Some(module(p, &["v2.0.0"]))));
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/mod/v3")
            .returning(|_, _| Ok(None));
        let pm = unused_package_manager();

        let results = check_updates(
            &proxy,
            &pm,
            vec![dep("example.com/mod", "v1.1.3-0.20240916144458-20a13a1f6b7c")],
            NORMAL,
        )
        .await;

        assert_eq!(
            results[0].outcome.as_ref().unwrap(),
            &Some(upgrade(
                "example.com/mod",
                "v1.1.3-0.20240916144458-20a13a1f6b7c",
                "v2.0.0"
            ))
        );
    }

    #[tokio::test]
    async fn check_updates_attributes_listing_failure_to_pseudo_versions() {
        let mut proxy = MockModuleProxy::new();
        proxy
            .expect_query()
            .withf(|p, _| p == "example.com/tagged")
            .returning(|p, _| Ok(Some(module(p, &["v0.3.0"]))));
        let mut pm = MockPackageManager::new();
        pm.expect_list_updates().times(1).returning(|| {
            Err(CommandError::Failed {
                command: "go list".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "go: not in a module".to_string(),
            })
        });

        let results = check_updates(
            &proxy,
            &pm,
            vec![
                dep("example.com/a", "v0.0.0-20210101000000-abcdef123456"),
                dep("example.com/tagged", "v0.2.0"),
                dep("example.com/b", "v0.0.0-20210101000000-abcdef123456"),
            ],
            NORMAL,
        )
        .await;

        assert!(matches!(results[0].outcome, Err(CheckError::Listing(_))));
        assert_eq!(
            results[1].outcome.as_ref().unwrap(),
            &Some(upgrade("example.com/tagged", "v0.2.0", "v0.3.0"))
        );
        assert!(matches!(results[2].outcome, Err(CheckError::Listing(_))));
    }

    #[test]
    fn parse_update_listing_ignores_unrelated_lines() {
        let output = "example.com/a: [v1.0.0] [v1.1.0]\ngo: downloading example.com/b v1.0.0\n\n";

        let updates = parse_update_listing(output);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates["example.com/a"], "v1.1.0");
    }

    #[rstest]
    #[case("gopkg.in/yaml", "v2.4.0", "v3.0.1", "gopkg.in/yaml.v3")]
    #[case("example.com/mod", "v1.2.0", "v2.0.0", "example.com/mod/v2")]
    #[case("example.com/mod", "v1.2.0", "v1.3.0", "example.com/mod")]
    #[case("example.com/mod", "v1.2.0", "v3.0.0+incompatible", "example.com/mod")]
    fn resolved_upgrade_new_path(
        #[case] path: &str,
        #[case] old: &str,
        #[case] new: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(upgrade(path, old, new).new_path(), expected);
    }

    #[test]
    fn resolved_upgrade_old_version_strips_build() {
        let resolved = upgrade("example.com/mod", "v2.1.1+incompatible", "v3.0.0");
        assert_eq!(resolved.old_version(), "v2.1.1");
    }
}
