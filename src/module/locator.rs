//! Owning-module lookup for package import paths

use tracing::debug;

use crate::module::error::LocateError;
use crate::module::path::{check_path, join_path, major_of, module_prefix, split_path};
use crate::module::proxy::ModuleProxy;
use crate::module::types::Module;

/// Finds the module that provides the package `import_path`.
///
/// Candidate module paths are probed from the full import path, dropping one
/// trailing element at a time. The first path the proxy knows wins.
pub async fn locate_module(
    proxy: &dyn ModuleProxy,
    import_path: &str,
    cached: bool,
) -> Result<Module, LocateError> {
    let mut candidate = import_path;

    while !candidate.is_empty() {
        if check_path(candidate).is_ok() {
            if let Some(module) = proxy.query(candidate, cached).await? {
                debug!("{} is provided by {}", import_path, module.path);
                return verify_major(module, import_path);
            }
        }

        match candidate.rsplit_once('/') {
            Some((parent, last)) if !last.is_empty() => candidate = parent,
            _ => break,
        }
    }

    Err(LocateError::NotFound(import_path.to_string()))
}

/// Rejects a match whose major version differs from the one the import names.
///
/// `github.com/x/y/v3/pkg` may be answered by `github.com/x/y` when no `/v3`
/// module exists; the error then names the import that would work.
fn verify_major(module: Module, import_path: &str) -> Result<Module, LocateError> {
    let prefix = module_prefix(&module.path);
    let Some((module_path, subdir)) = split_path(prefix, import_path) else {
        return Ok(module);
    };
    if module_path == module.path {
        return Ok(module);
    }
    let Some(major) = major_of(&module_path) else {
        return Ok(module);
    };

    let filter = if major.is_empty() {
        String::new()
    } else {
        format!("{}.", major)
    };

    match module.max_version(&filter, false) {
        Some(version) => Err(LocateError::NotInModule {
            import: import_path.to_string(),
            spec: format!("{}@{}", join_path(prefix, &version, &subdir), version),
        }),
        None => Err(LocateError::MajorNotFound {
            import: import_path.to_string(),
            prefix: prefix.to_string(),
        }),
    }
}
