//! Package manager side effects (`go get`, `go mod tidy`, `go list`,
//! `go version -m`, `go install`)

#[cfg(test)]
use mockall::automock;

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::upgrade::error::CommandError;

/// Template for `go list -u` printing direct dependencies that have an update
const LIST_UPDATES_FORMAT: &str = "{{if (and (not (or .Main .Indirect)) .Update)}}{{.Path}}: [{{.Version}}] [{{.Update.Version}}]{{end}}";

/// Trait for the package manager commands the upgrade flow depends on
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageManager: Send + Sync {
    /// Pin `module_path@version` in the manifest
    async fn get(&self, module_path: &str, version: &str) -> Result<(), CommandError>;

    /// Normalize the manifest
    async fn tidy(&self) -> Result<(), CommandError>;

    /// List known updates for direct dependencies, one
    /// `path: [current] [update]` line per module
    async fn list_updates(&self) -> Result<String, CommandError>;

    /// Print build information of the Go binaries at `target` (a file or a
    /// directory)
    async fn list_binaries(&self, target: &Path) -> Result<String, CommandError>;

    /// Install the latest version of the package `package_path`
    async fn install(&self, package_path: &str) -> Result<(), CommandError>;
}

/// PackageManager backed by the `go` command
pub struct GoCommand {
    program: String,
    dir: PathBuf,
}

impl GoCommand {
    /// Runs `go` inside `dir`
    pub fn new(dir: &Path) -> Self {
        Self::with_program("go", dir)
    }

    pub fn with_program(program: &str, dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            dir: dir.to_path_buf(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running `{}` in {}", command, self.dir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.dir)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("`{}` failed with {}: {}", command, output.status, stderr);
            return Err(CommandError::Failed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl PackageManager for GoCommand {
    async fn get(&self, module_path: &str, version: &str) -> Result<(), CommandError> {
        let spec = format!("{}@{}", module_path, version);
        self.run(&["get", "-u", &spec]).await.map(|_| ())
    }

    async fn tidy(&self) -> Result<(), CommandError> {
        self.run(&["mod", "tidy"]).await.map(|_| ())
    }

    async fn list_updates(&self) -> Result<String, CommandError> {
        self.run(&["list", "-u", "-f", LIST_UPDATES_FORMAT, "-m", "all"])
            .await
    }

    async fn list_binaries(&self, target: &Path) -> Result<String, CommandError> {
        let target = target.to_string_lossy();
        self.run(&["version", "-m", &target]).await
    }

    async fn install(&self, package_path: &str) -> Result<(), CommandError> {
        let spec = format!("{}@latest", package_path);
        self.run(&["install", &spec]).await.map(|_| ())
    }
}
