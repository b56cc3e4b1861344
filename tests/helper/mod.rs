//! Shared test utilities

#![allow(dead_code)]

mod package_manager;
mod proxy;

pub use package_manager::{Call, RecordingPackageManager};
pub use proxy::MockProxy;

use std::fs;
use std::path::Path;

use gcu::manifest::Dependency;

/// Write `files` (relative path, content) below `root`
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

pub fn dep(path: &str, version: &str) -> Dependency {
    Dependency {
        path: path.to_string(),
        version: version.to_string(),
        indirect: false,
    }
}
