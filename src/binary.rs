//! Reinstall Go binaries at their latest version
//!
//! `go version -m` reports the main package each binary was built from:
//!
//! ```text
//! /home/user/go/bin/gopls: go1.22.0
//!         path    golang.org/x/tools/gopls
//!         mod     golang.org/x/tools/gopls        v0.15.0 h1:...
//! ```
//!
//! Every listed package is reinstalled with `go install <path>@latest`.

use std::path::Path;

use futures::future::join_all;
use tracing::{info, warn};

use crate::upgrade::error::CommandError;
use crate::upgrade::package_manager::PackageManager;

/// Outcome of reinstalling one binary
#[derive(Debug)]
pub struct BinaryUpdate {
    /// Main package the binary was built from
    pub path: String,
    pub outcome: Result<(), CommandError>,
}

/// Extract main package paths from `go version -m` output, without duplicates
pub fn parse_binary_paths(output: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for line in output.lines() {
        let Some(path) = line.trim().strip_prefix("path\t") else {
            continue;
        };
        let path = path.trim();
        if !path.is_empty() && !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }
    paths
}

/// Reinstalls every Go binary found at `target` at its latest version.
///
/// Installs run concurrently. A failed install is attributed to its
/// package; only a failure to list the binaries aborts.
pub async fn update_binaries(
    package_manager: &dyn PackageManager,
    target: &Path,
) -> Result<Vec<BinaryUpdate>, CommandError> {
    let output = package_manager.list_binaries(target).await?;
    let paths = parse_binary_paths(&output);
    info!("Updating {} binaries in {}", paths.len(), target.display());

    let futures = paths.into_iter().map(|path| async move {
        let outcome = package_manager.install(&path).await;
        if let Err(e) = &outcome {
            warn!("Failed to install {}: {}", path, e);
        }
        BinaryUpdate { path, outcome }
    });

    Ok(join_all(futures).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrade::package_manager::MockPackageManager;

    const VERSION_OUTPUT: &str = "/home/user/go/bin/gopls: go1.22.0
\tpath\tgolang.org/x/tools/gopls
\tmod\tgolang.org/x/tools/gopls\tv0.15.0\th1:abc=
\tdep\tgolang.org/x/mod\tv0.15.0\th1:def=
\tbuild\t-compiler=gc
/home/user/go/bin/staticcheck: go1.22.0
\tpath\thonnef.co/go/tools/cmd/staticcheck
\tmod\thonnef.co/go/tools\tv0.4.6\th1:ghi=
";

    #[test]
    fn parse_binary_paths_collects_main_packages() {
        assert_eq!(
            parse_binary_paths(VERSION_OUTPUT),
            vec!["golang.org/x/tools/gopls", "honnef.co/go/tools/cmd/staticcheck"]
        );
    }

    #[test]
    fn parse_binary_paths_skips_duplicates_and_other_lines() {
        let output = "a: go1.22.0\n\tpath\texample.com/cmd/a\nb: go1.22.0\n\tpath\texample.com/cmd/a\n\tpathological\tx\n";

        assert_eq!(parse_binary_paths(output), vec!["example.com/cmd/a"]);
    }

    #[tokio::test]
    async fn update_binaries_installs_every_listed_package() {
        let mut pm = MockPackageManager::new();
        pm.expect_list_binaries()
            .withf(|target| target == Path::new("/home/user/go/bin"))
            .times(1)
            .returning(|_| Ok(VERSION_OUTPUT.to_string()));
        pm.expect_install()
            .withf(|path| path == "golang.org/x/tools/gopls")
            .times(1)
            .returning(|_| Ok(()));
        pm.expect_install()
            .withf(|path| path == "honnef.co/go/tools/cmd/staticcheck")
            .times(1)
            .returning(|_| {
                Err(CommandError::Failed {
                    command: "go install".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "no matching versions".to_string(),
                })
            });

        let updates = update_binaries(&pm, Path::new("/home/user/go/bin"))
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].path, "golang.org/x/tools/gopls");
        assert!(updates[0].outcome.is_ok());
        assert_eq!(updates[1].path, "honnef.co/go/tools/cmd/staticcheck");
        assert!(matches!(updates[1].outcome, Err(CommandError::Failed { .. })));
    }

    #[tokio::test]
    async fn update_binaries_stops_when_listing_fails() {
        let mut pm = MockPackageManager::new();
        pm.expect_list_binaries().times(1).returning(|_| {
            Err(CommandError::Failed {
                command: "go version -m".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "no such file".to_string(),
            })
        });
        pm.expect_install().times(0);

        let result = update_binaries(&pm, Path::new("missing")).await;

        assert!(matches!(result, Err(CommandError::Failed { .. })));
    }
}
