//! Import path rewriting for Go source trees
//!
//! When a dependency moves to a new major version its import path changes
//! (`example.com/mod/sub` → `example.com/mod/v2/sub`). This module walks a
//! module's source tree and rewrites import literals according to a caller
//! supplied policy.
//!
//! # Modules
//!
//! - [`go_imports`]: tree-sitter based import extraction for one file
//! - [`error`]: Error types

pub mod error;
pub mod go_imports;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::MANIFEST_FILE;
use crate::rewrite::error::RewriteError;
use crate::rewrite::go_imports::{ParsedSource, parse_imports, quote};

/// Directories never descended into
const SKIPPED_DIRS: [&str; 4] = [".git", ".vscode", ".idea", "vendor"];

/// A single import occurrence handed to the replace policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Current import path
    pub path: String,
}

/// What the replace policy wants done with an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportAction {
    /// Write this path instead
    Replace(String),
    /// Leave the import untouched
    Skip,
}

/// Rewrites imports in every Go file below `root`.
///
/// Nested modules (directories with their own go.mod) and vendored or
/// editor directories are skipped. Returns the number of files changed.
pub fn rewrite_tree<F>(root: &Path, mut replace: F) -> Result<usize, RewriteError>
where
    F: FnMut(&ImportReference) -> Result<ImportAction, RewriteError>,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry));

    let mut changed = 0;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("import rewrite: {}", e);
                continue;
            }
        };

        let is_go_file = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "go");
        if is_go_file && rewrite_file(entry.path(), &mut replace)? {
            changed += 1;
        }
    }

    info!("Rewrote imports in {} files under {}", changed, root.display());
    Ok(changed)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    if SKIPPED_DIRS.iter().any(|dir| name == *dir) {
        return true;
    }

    match entry.path().join(MANIFEST_FILE).try_exists() {
        Ok(true) => {
            debug!("Skipping nested module {}", entry.path().display());
            true
        }
        Ok(false) => false,
        Err(e) => {
            warn!("import rewrite: {}: {}", entry.path().display(), e);
            true
        }
    }
}

/// Rewrites imports in a single Go file.
///
/// Returns true if the file was changed. Files whose imports are all left
/// as they are keep their bytes and metadata.
pub fn rewrite_file<F>(path: &Path, replace: &mut F) -> Result<bool, RewriteError>
where
    F: FnMut(&ImportReference) -> Result<ImportAction, RewriteError>,
{
    let content = fs::read_to_string(path).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let imports = match parse_imports(&content) {
        Ok(ParsedSource::Imports(imports)) => imports,
        Ok(ParsedSource::NoPackage) => {
            debug!("Skipping {}: no package clause", path.display());
            return Ok(false);
        }
        Err(source) => {
            return Err(RewriteError::Parse {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut edits = Vec::new();
    for import in imports {
        let reference = ImportReference {
            file: path.to_path_buf(),
            line: import.line,
            column: import.column,
            path: import.path.clone(),
        };

        match replace(&reference)? {
            ImportAction::Replace(new_path) if new_path != import.path => {
                debug!(
                    "{}:{}:{}: {} -> {}",
                    path.display(),
                    import.line,
                    import.column,
                    import.path,
                    new_path
                );
                edits.push((import.range, quote(&new_path, import.raw)));
            }
            ImportAction::Replace(_) | ImportAction::Skip => {}
        }
    }

    if edits.is_empty() {
        return Ok(false);
    }

    let mut output = content;
    for (range, literal) in edits.into_iter().rev() {
        output.replace_range(range, &literal);
    }

    write_atomically(path, output.as_bytes()).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(true)
}

/// Writes `contents` to a sibling temporary file carrying the permissions of
/// `path`, then renames it over `path`.
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = tempfile::Builder::new()
        .prefix(".gcu-")
        .suffix(".temp")
        .tempfile_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.as_file().set_permissions(permissions)?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
