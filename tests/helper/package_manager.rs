//! Package manager that records calls instead of running `go`

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use gcu::upgrade::error::CommandError;
use gcu::upgrade::package_manager::PackageManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get { path: String, version: String },
    Tidy,
    ListUpdates,
    ListBinaries(PathBuf),
    Install(String),
}

#[derive(Default)]
pub struct RecordingPackageManager {
    listing: String,
    binaries: String,
    calls: Mutex<Vec<Call>>,
}

impl RecordingPackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned by `list_updates`
    pub fn with_listing(mut self, listing: &str) -> Self {
        self.listing = listing.to_string();
        self
    }

    /// Output returned by `list_binaries`
    pub fn with_binaries(mut self, binaries: &str) -> Self {
        self.binaries = binaries.to_string();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PackageManager for RecordingPackageManager {
    async fn get(&self, module_path: &str, version: &str) -> Result<(), CommandError> {
        self.record(Call::Get {
            path: module_path.to_string(),
            version: version.to_string(),
        });
        Ok(())
    }

    async fn tidy(&self) -> Result<(), CommandError> {
        self.record(Call::Tidy);
        Ok(())
    }

    async fn list_updates(&self) -> Result<String, CommandError> {
        self.record(Call::ListUpdates);
        Ok(self.listing.clone())
    }

    async fn list_binaries(&self, target: &Path) -> Result<String, CommandError> {
        self.record(Call::ListBinaries(target.to_path_buf()));
        Ok(self.binaries.clone())
    }

    async fn install(&self, package_path: &str) -> Result<(), CommandError> {
        self.record(Call::Install(package_path.to_string()));
        Ok(())
    }
}
